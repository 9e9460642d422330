//! Wire models for the Open Trivia DB response format.

use serde::Deserialize;

/// Response code the provider uses to signal success.
pub const RESPONSE_CODE_SUCCESS: u8 = 0;

/// Top-level provider response envelope.
#[derive(Debug, Deserialize)]
pub struct TriviaResponse {
    /// Application-level status; 0 means success.
    pub response_code: u8,
    /// Retrieved question records; may be missing on failure.
    #[serde(default)]
    pub results: Vec<QuestionRecord>,
}

/// One raw question record as delivered by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    /// Prompt text.
    pub question: String,
    /// The single correct answer.
    pub correct_answer: String,
    /// All incorrect answers.
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}
