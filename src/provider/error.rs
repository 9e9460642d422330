use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for question provider operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Error raised while retrieving questions from the external provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or completed.
    #[error("failed to reach question provider: {source}")]
    Request {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("question provider returned status {status}")]
    Status {
        /// HTTP status reported by the provider.
        status: StatusCode,
    },
    /// The response body could not be decoded.
    #[error("failed to decode provider response: {source}")]
    Decode {
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// The provider rejected the request at the application level.
    #[error("question provider rejected the request (response code {code})")]
    Provider {
        /// Provider-specific response code (0 means success).
        code: u8,
    },
    /// The provider answered successfully but with an empty result list.
    #[error("question provider returned no questions")]
    EmptyResults,
}
