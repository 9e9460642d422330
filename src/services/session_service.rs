use tracing::{debug, info};

use crate::{
    dto::{
        phase::VisiblePhase,
        session::{ActionResponse, SelectAnswerRequest, SessionSnapshot, StartSessionRequest},
    },
    error::ServiceError,
    services::{sse_events, timer_service},
    state::{
        SharedState,
        session::{Difficulty, QuizSession},
        state_machine::{FinishReason, SessionEvent, SessionPhase},
        timer::LOW_TIME_THRESHOLD,
        transitions::run_transition_with_broadcast,
    },
};

/// Start a new session: fetch questions, install the session and its
/// countdown, and move the lifecycle to playing.
///
/// The fetch runs inside the planned start transition, so a failure leaves
/// the machine idle and a concurrent second start is rejected instead of
/// initializing a second session.
pub async fn start_session(
    state: &SharedState,
    request: StartSessionRequest,
) -> Result<SessionSnapshot, ServiceError> {
    let difficulty = Difficulty::from(request.difficulty);
    let category = request.category;
    let st = state.clone();

    run_transition_with_broadcast(state, SessionEvent::Start, move || async move {
        let records = st
            .provider()
            .fetch_questions(
                &category,
                difficulty.provider_id(),
                st.config().question_count(),
            )
            .await?;

        let session = QuizSession::new(category, difficulty, records);
        let budget = session.initial_time_budget();
        info!(
            session_id = %session.id,
            questions = session.total_questions(),
            budget,
            "starting quiz session"
        );

        st.with_session_slot_mut(|slot| {
            *slot = Some(session);
        })
        .await;
        timer_service::start_countdown(&st, budget).await;
        Ok(())
    })
    .await?;

    Ok(build_snapshot(state).await)
}

/// Toggle between playing and paused, freezing or unfreezing the countdown.
/// Outside of gameplay the toggle is a logged no-op.
pub async fn toggle_pause(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let phase = state.state_machine_phase().await;
    let event = match phase {
        SessionPhase::Playing => Some(SessionEvent::Pause),
        SessionPhase::Paused => Some(SessionEvent::Resume),
        other => {
            debug!(phase = ?other, "ignoring pause toggle outside gameplay");
            None
        }
    };

    if let Some(event) = event {
        let paused = event == SessionEvent::Pause;
        let st = state.clone();
        run_transition_with_broadcast(state, event, move || async move {
            st.set_timer_paused(paused).await;
            Ok(())
        })
        .await?;
        info!(paused, "pause toggled");
    }

    Ok(build_snapshot(state).await)
}

/// Record the player's pick for the current question.
///
/// Answering the final question ends the session immediately; otherwise the
/// session stays in the playing phase awaiting an explicit advance. Picks
/// arriving outside the playing phase are ignored.
pub async fn select_answer(
    state: &SharedState,
    request: SelectAnswerRequest,
) -> Result<SessionSnapshot, ServiceError> {
    let phase = state.state_machine_phase().await;
    if phase != SessionPhase::Playing {
        debug!(?phase, "ignoring answer outside the playing phase");
        return Ok(build_snapshot(state).await);
    }

    let (correct, score, last) = state
        .with_session_mut(|session| {
            let correct = session.record_answer(request.answer_index)?;
            Ok((correct, session.score.current(), session.is_last_question()))
        })
        .await?;

    info!(correct, score, "answer recorded");
    sse_events::broadcast_score_changed(state, score);

    if last {
        let st = state.clone();
        run_transition_with_broadcast(
            state,
            SessionEvent::Finish(FinishReason::QuestionsExhausted),
            move || async move {
                st.clear_timer().await;
                Ok(())
            },
        )
        .await?;
        info!(score, "session ended: all questions answered");
    }

    Ok(build_snapshot(state).await)
}

/// Advance to the next question after the current one was answered.
/// Ignored outside the playing phase; advancing past the last question is
/// a no-op because answering it already ended the session.
pub async fn next_question(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let phase = state.state_machine_phase().await;
    if phase != SessionPhase::Playing {
        debug!(?phase, "ignoring advance outside the playing phase");
        return Ok(build_snapshot(state).await);
    }

    let advanced = state
        .with_session_mut(|session| {
            if !session.answered_current {
                return Err(ServiceError::InvalidState(
                    "current question has not been answered".into(),
                ));
            }
            Ok(session
                .advance()
                .then(|| (session.current_index, session.total_questions())))
        })
        .await?;

    match advanced {
        Some((current_index, total_questions)) => {
            sse_events::broadcast_question_advanced(state, current_index, total_questions);
        }
        None => debug!("no further question to advance to"),
    }

    Ok(build_snapshot(state).await)
}

/// Replay the same questions from the ended phase: reshuffle, reset score
/// and index, start a fresh countdown. No re-fetch.
pub async fn restart(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let st = state.clone();
    run_transition_with_broadcast(state, SessionEvent::Restart, move || async move {
        let budget = st
            .with_session_mut(|session| {
                session.reshuffle_for_restart();
                Ok(session.initial_time_budget())
            })
            .await?;
        timer_service::start_countdown(&st, budget).await;
        Ok(())
    })
    .await?;

    info!("session restarted with the same questions");
    Ok(build_snapshot(state).await)
}

/// Drop the ended session and return to the selection screen.
pub async fn play_again(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let st = state.clone();
    run_transition_with_broadcast(state, SessionEvent::PlayAgain, move || async move {
        st.clear_timer().await;
        st.with_session_slot_mut(|slot| {
            slot.take();
        })
        .await;
        Ok(())
    })
    .await?;

    info!("session cleared, back to selection");
    Ok(build_snapshot(state).await)
}

/// Abandon a running or paused session, landing on the ended phase with the
/// score accumulated so far.
pub async fn quit(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let st = state.clone();
    run_transition_with_broadcast(
        state,
        SessionEvent::Finish(FinishReason::Abandoned),
        move || async move {
            st.clear_timer().await;
            Ok(())
        },
    )
    .await?;

    let score = state
        .with_session(|session| Ok(session.score.current()))
        .await
        .unwrap_or(0);
    info!(score, "session abandoned");

    Ok(ActionResponse {
        message: format!("session abandoned with score {score}"),
    })
}

/// End the session because the countdown reached zero. Called from the
/// ticking task, which stops itself afterwards.
pub async fn finish_on_expiry(state: &SharedState) -> Result<(), ServiceError> {
    run_transition_with_broadcast(
        state,
        SessionEvent::Finish(FinishReason::TimeExpired),
        || async { Ok(()) },
    )
    .await?;

    info!("session ended: countdown expired");
    Ok(())
}

/// Assemble the read-only snapshot returned by every action and by the
/// snapshot route.
pub async fn build_snapshot(state: &SharedState) -> SessionSnapshot {
    let phase: VisiblePhase = state.state_machine_phase().await.into();
    let remaining = state.timer_remaining().await;

    let mut snapshot = state
        .read_session(|maybe| match maybe {
            Some(session) => SessionSnapshot::empty().with_session(session, phase),
            None => SessionSnapshot::empty(),
        })
        .await;

    snapshot.phase = phase;
    snapshot.time_remaining = remaining;
    snapshot.low_time_warning = matches!(phase, VisiblePhase::Playing | VisiblePhase::Paused)
        && remaining.is_some_and(|left| left > 0 && left <= LOW_TIME_THRESHOLD);
    snapshot
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::session::DifficultyDto,
        provider::{
            QuestionProvider,
            error::{FetchError, FetchResult},
            models::QuestionRecord,
        },
        state::AppState,
    };

    struct MockProvider {
        records: Vec<QuestionRecord>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn with_questions(count: usize) -> Self {
            let records = (0..count)
                .map(|i| QuestionRecord {
                    question: format!("q{i}"),
                    correct_answer: "right".to_string(),
                    incorrect_answers: vec!["a".into(), "b".into(), "c".into()],
                })
                .collect();
            Self {
                records,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                records: Vec::new(),
                fail: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl QuestionProvider for MockProvider {
        fn fetch_questions(
            &self,
            _category: &str,
            _difficulty: &str,
            _amount: u8,
        ) -> BoxFuture<'static, FetchResult<Vec<QuestionRecord>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail {
                Err(FetchError::EmptyResults)
            } else {
                Ok(self.records.clone())
            };
            Box::pin(async move { result })
        }
    }

    /// Provider that holds the fetch until released, simulating a slow network.
    struct BlockedProvider {
        release: Arc<tokio::sync::Notify>,
        records: Vec<QuestionRecord>,
    }

    impl QuestionProvider for BlockedProvider {
        fn fetch_questions(
            &self,
            _category: &str,
            _difficulty: &str,
            _amount: u8,
        ) -> BoxFuture<'static, FetchResult<Vec<QuestionRecord>>> {
            let release = self.release.clone();
            let records = self.records.clone();
            Box::pin(async move {
                release.notified().await;
                Ok(records)
            })
        }
    }

    fn test_state(provider: MockProvider) -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(provider))
    }

    fn start_request(difficulty: DifficultyDto) -> StartSessionRequest {
        StartSessionRequest {
            category: "9".to_string(),
            difficulty,
        }
    }

    async fn correct_index(state: &SharedState) -> usize {
        state
            .with_session(|session| {
                Ok(session
                    .current_question()
                    .and_then(|question| question.correct_index())
                    .unwrap())
            })
            .await
            .unwrap()
    }

    async fn wrong_index(state: &SharedState) -> usize {
        state
            .with_session(|session| {
                let question = session.current_question().unwrap();
                Ok(question
                    .answers
                    .iter()
                    .position(|answer| !answer.correct)
                    .unwrap())
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn start_session_moves_to_playing_with_full_budget() {
        let state = test_state(MockProvider::with_questions(3));

        let snapshot = start_session(&state, start_request(DifficultyDto::Medium))
            .await
            .unwrap();

        assert_eq!(snapshot.phase, VisiblePhase::Playing);
        assert_eq!(snapshot.total_questions, Some(3));
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(snapshot.score, Some(0));
        assert_eq!(snapshot.time_remaining, Some(18));
        assert!(snapshot.current_question.is_some());
        // Correctness is not revealed before an answer.
        let question = snapshot.current_question.unwrap();
        assert!(question.answers.iter().all(|answer| answer.status.is_none()));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_machine_idle() {
        let state = test_state(MockProvider::failing());

        let err = start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Fetch(_)));

        assert_eq!(state.state_machine_phase().await, SessionPhase::Idle);
        assert!(state.read_session(|maybe| maybe.is_none()).await);
        assert_eq!(state.timer_remaining().await, None);
    }

    #[tokio::test]
    async fn second_start_is_rejected_and_session_untouched() {
        let state = test_state(MockProvider::with_questions(2));

        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();
        let first_id = state.with_session(|s| Ok(s.id)).await.unwrap();

        let err = start_session(&state, start_request(DifficultyDto::Hard))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let second_id = state.with_session(|s| Ok(s.id)).await.unwrap();
        assert_eq!(first_id, second_id);
        assert_eq!(state.state_machine_phase().await, SessionPhase::Playing);
    }

    #[tokio::test]
    async fn second_start_during_inflight_fetch_is_rejected() {
        let release = Arc::new(tokio::sync::Notify::new());
        let provider = BlockedProvider {
            release: release.clone(),
            records: vec![QuestionRecord {
                question: "q0".to_string(),
                correct_answer: "right".to_string(),
                incorrect_answers: vec!["a".into(), "b".into(), "c".into()],
            }],
        };
        let state = AppState::new(AppConfig::default(), Arc::new(provider));

        let first = tokio::spawn({
            let state = state.clone();
            async move { start_session(&state, start_request(DifficultyDto::Easy)).await }
        });
        // Let the first start take the transition gate and block in the fetch.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let second = tokio::spawn({
            let state = state.clone();
            async move { start_session(&state, start_request(DifficultyDto::Hard)).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        release.notify_one();

        let first_result = first.await.unwrap();
        let second_result = second.await.unwrap();

        assert!(first_result.is_ok());
        let err = second_result.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // The session is the first start's: one easy question, full budget.
        assert_eq!(state.state_machine_phase().await, SessionPhase::Playing);
        let difficulty = state.with_session(|s| Ok(s.difficulty)).await.unwrap();
        assert_eq!(difficulty, Difficulty::Easy);
        assert_eq!(state.timer_remaining().await, Some(8));
    }

    #[tokio::test]
    async fn pause_toggle_round_trips_and_is_a_noop_when_idle() {
        let state = test_state(MockProvider::with_questions(2));

        // Toggling before any session exists changes nothing.
        let snapshot = toggle_pause(&state).await.unwrap();
        assert_eq!(snapshot.phase, VisiblePhase::Idle);

        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();

        let snapshot = toggle_pause(&state).await.unwrap();
        assert_eq!(snapshot.phase, VisiblePhase::Paused);

        let snapshot = toggle_pause(&state).await.unwrap();
        assert_eq!(snapshot.phase, VisiblePhase::Playing);
    }

    #[tokio::test]
    async fn answering_a_non_final_question_stays_playing() {
        let state = test_state(MockProvider::with_questions(3));
        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();

        let pick = correct_index(&state).await;
        let snapshot = select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();

        assert_eq!(snapshot.phase, VisiblePhase::Playing);
        assert_eq!(snapshot.score, Some(1));
        // Correctness is revealed on the answered question.
        let question = snapshot.current_question.unwrap();
        assert!(question.answers.iter().all(|answer| answer.status.is_some()));
    }

    #[tokio::test]
    async fn answering_the_final_question_ends_the_session() {
        let state = test_state(MockProvider::with_questions(1));
        start_session(&state, start_request(DifficultyDto::Hard))
            .await
            .unwrap();

        let pick = correct_index(&state).await;
        let snapshot = select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();

        assert_eq!(snapshot.phase, VisiblePhase::Ended);
        assert_eq!(snapshot.score, Some(1));
        assert_eq!(snapshot.time_remaining, None);
    }

    #[tokio::test]
    async fn mixed_answers_score_two_of_three() {
        let state = test_state(MockProvider::with_questions(3));
        start_session(&state, start_request(DifficultyDto::Medium))
            .await
            .unwrap();

        let pick = correct_index(&state).await;
        select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();
        next_question(&state).await.unwrap();

        let pick = wrong_index(&state).await;
        select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();
        next_question(&state).await.unwrap();

        let pick = correct_index(&state).await;
        let snapshot = select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();

        assert_eq!(snapshot.phase, VisiblePhase::Ended);
        assert_eq!(snapshot.score, Some(2));
        assert_eq!(snapshot.total_questions, Some(3));
    }

    #[tokio::test]
    async fn advance_requires_an_answer() {
        let state = test_state(MockProvider::with_questions(2));
        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();

        let err = next_question(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let pick = correct_index(&state).await;
        select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();
        let snapshot = next_question(&state).await.unwrap();
        assert_eq!(snapshot.current_index, Some(1));
    }

    #[tokio::test]
    async fn answer_outside_playing_is_ignored() {
        let state = test_state(MockProvider::with_questions(1));

        let snapshot = select_answer(&state, SelectAnswerRequest { answer_index: 0 })
            .await
            .unwrap();
        assert_eq!(snapshot.phase, VisiblePhase::Idle);
        assert_eq!(snapshot.score, None);
    }

    #[tokio::test]
    async fn restart_reuses_questions_without_refetch() {
        let provider = MockProvider::with_questions(2);
        let calls = provider.calls.clone();
        let state = test_state(provider);

        start_session(&state, start_request(DifficultyDto::Medium))
            .await
            .unwrap();

        let pick = correct_index(&state).await;
        select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();
        next_question(&state).await.unwrap();
        let pick = correct_index(&state).await;
        select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();
        assert_eq!(state.state_machine_phase().await, SessionPhase::Ended);

        let snapshot = restart(&state).await.unwrap();
        assert_eq!(snapshot.phase, VisiblePhase::Playing);
        assert_eq!(snapshot.score, Some(0));
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(snapshot.total_questions, Some(2));
        assert_eq!(snapshot.time_remaining, Some(12));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn play_again_clears_the_session() {
        let state = test_state(MockProvider::with_questions(1));
        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();

        let pick = correct_index(&state).await;
        select_answer(&state, SelectAnswerRequest { answer_index: pick })
            .await
            .unwrap();

        let snapshot = play_again(&state).await.unwrap();
        assert_eq!(snapshot.phase, VisiblePhase::Idle);
        assert_eq!(snapshot.time_remaining, None);
        assert!(state.read_session(|maybe| maybe.is_none()).await);
    }

    #[tokio::test]
    async fn quit_abandons_a_running_session() {
        let state = test_state(MockProvider::with_questions(3));
        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();

        quit(&state).await.unwrap();
        assert_eq!(state.state_machine_phase().await, SessionPhase::Ended);
        assert_eq!(state.timer_remaining().await, None);
    }

    #[tokio::test]
    async fn expiry_transition_ends_the_session() {
        let state = test_state(MockProvider::with_questions(2));
        start_session(&state, start_request(DifficultyDto::Easy))
            .await
            .unwrap();

        finish_on_expiry(&state).await.unwrap();
        assert_eq!(state.state_machine_phase().await, SessionPhase::Ended);
    }
}
