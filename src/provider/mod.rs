//! Question retrieval boundary: the provider trait and its HTTP client.

pub mod error;
pub mod models;
pub mod open_trivia;

use futures::future::BoxFuture;

use crate::provider::{error::FetchResult, models::QuestionRecord};

/// Abstraction over the external question source.
///
/// Category and difficulty are opaque identifiers passed through to the
/// provider; implementations validate the response envelope and guarantee a
/// non-empty record list on success.
pub trait QuestionProvider: Send + Sync {
    /// Fetch `amount` multiple-choice questions for the given category and difficulty.
    fn fetch_questions(
        &self,
        category: &str,
        difficulty: &str,
        amount: u8,
    ) -> BoxFuture<'static, FetchResult<Vec<QuestionRecord>>>;
}
