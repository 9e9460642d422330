use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::SessionPhase;

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// No session is running; category/difficulty selection is shown.
    Idle,
    /// A question is presented and the countdown is ticking.
    Playing,
    /// Gameplay and the countdown are frozen.
    Paused,
    /// The final score is displayed.
    Ended,
}

impl From<&SessionPhase> for VisiblePhase {
    fn from(value: &SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => VisiblePhase::Idle,
            SessionPhase::Playing => VisiblePhase::Playing,
            SessionPhase::Paused => VisiblePhase::Paused,
            SessionPhase::Ended => VisiblePhase::Ended,
        }
    }
}

impl From<SessionPhase> for VisiblePhase {
    fn from(value: SessionPhase) -> Self {
        (&value).into()
    }
}
