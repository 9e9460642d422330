use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::session::SessionSnapshot;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event carrying a pre-rendered data string.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the session lifecycle phase changes.
pub struct PhaseChangedEvent(pub SessionSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per active countdown second.
pub struct TimerTickEvent {
    /// Seconds left after the tick.
    pub remaining: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast exactly once when the countdown crosses the low-time threshold.
pub struct TimerWarningEvent {
    /// Seconds left when the warning fired.
    pub remaining: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an answer changed the score.
pub struct ScoreChangedEvent {
    /// Correct answers so far.
    pub score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the session moved on to the next question.
pub struct QuestionAdvancedEvent {
    /// Zero-based index of the question now presented.
    pub current_index: usize,
    /// Total number of questions in the session.
    pub total_questions: usize,
}
