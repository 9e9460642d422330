//! HTTP client for the Open Trivia DB question API.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;

use crate::provider::{
    QuestionProvider,
    error::{FetchError, FetchResult},
    models::{QuestionRecord, RESPONSE_CODE_SUCCESS, TriviaResponse},
};

/// Client for the Open Trivia DB `api.php` endpoint.
#[derive(Clone)]
pub struct OpenTriviaClient {
    client: Client,
    base_url: Arc<str>,
}

impl OpenTriviaClient {
    /// Build a client for the given API endpoint URL.
    pub fn new(base_url: &str) -> FetchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| FetchError::Request { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        })
    }

    async fn fetch(
        &self,
        category: &str,
        difficulty: &str,
        amount: u8,
    ) -> FetchResult<Vec<QuestionRecord>> {
        let response = self
            .client
            .get(self.base_url.as_ref())
            .query(&[
                ("amount", amount.to_string()),
                ("category", category.to_string()),
                ("difficulty", difficulty.to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Request { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let body: TriviaResponse = response
            .json()
            .await
            .map_err(|source| FetchError::Decode { source })?;

        if body.response_code != RESPONSE_CODE_SUCCESS {
            return Err(FetchError::Provider {
                code: body.response_code,
            });
        }

        if body.results.is_empty() {
            return Err(FetchError::EmptyResults);
        }

        debug!(
            category,
            difficulty,
            count = body.results.len(),
            "fetched questions from provider"
        );

        Ok(body.results)
    }
}

impl QuestionProvider for OpenTriviaClient {
    fn fetch_questions(
        &self,
        category: &str,
        difficulty: &str,
        amount: u8,
    ) -> BoxFuture<'static, FetchResult<Vec<QuestionRecord>>> {
        let this = self.clone();
        let category = category.to_string();
        let difficulty = difficulty.to_string();
        Box::pin(async move { this.fetch(&category, &difficulty, amount).await })
    }
}
