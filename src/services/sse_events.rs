use serde::Serialize;
use tracing::warn;

use crate::{
    dto::sse::{
        PhaseChangedEvent, QuestionAdvancedEvent, ScoreChangedEvent, ServerEvent, TimerTickEvent,
        TimerWarningEvent,
    },
    services::session_service,
    state::SharedState,
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_TIMER_TICK: &str = "timer_tick";
const EVENT_TIMER_WARNING: &str = "timer_warning";
const EVENT_SCORE_CHANGED: &str = "score_changed";
const EVENT_QUESTION_ADVANCED: &str = "question_advanced";

/// Broadcast a lifecycle phase change, carrying a full session snapshot.
pub async fn broadcast_phase_changed(state: &SharedState) {
    let snapshot = session_service::build_snapshot(state).await;
    send_public_event(state, EVENT_PHASE_CHANGED, &PhaseChangedEvent(snapshot));
}

/// Broadcast one countdown decrement.
pub fn broadcast_timer_tick(state: &SharedState, remaining: u32) {
    let payload = TimerTickEvent { remaining };
    send_public_event(state, EVENT_TIMER_TICK, &payload);
}

/// Broadcast the one-shot low-time warning.
pub fn broadcast_timer_warning(state: &SharedState, remaining: u32) {
    let payload = TimerWarningEvent { remaining };
    send_public_event(state, EVENT_TIMER_WARNING, &payload);
}

/// Broadcast the score after an answer was recorded.
pub fn broadcast_score_changed(state: &SharedState, score: u32) {
    let payload = ScoreChangedEvent { score };
    send_public_event(state, EVENT_SCORE_CHANGED, &payload);
}

/// Broadcast that the session moved on to the next question.
pub fn broadcast_question_advanced(state: &SharedState, current_index: usize, total_questions: usize) {
    let payload = QuestionAdvancedEvent {
        current_index,
        total_questions,
    };
    send_public_event(state, EVENT_QUESTION_ADVANCED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
