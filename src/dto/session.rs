use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{format_system_time, phase::VisiblePhase, validation::validate_category},
    state::session::{Difficulty, Question, QuizSession},
};

/// Payload used to start a brand-new quiz session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    /// Numeric provider category identifier (e.g. "9" for general knowledge).
    pub category: String,
    /// Difficulty, fixing the per-question time budget.
    pub difficulty: DifficultyDto,
}

impl Validate for StartSessionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_category(&self.category) {
            errors.add("category", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Difficulty identifier accepted from and echoed back to clients.
#[derive(Debug, Deserialize, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyDto {
    /// 8 seconds per question.
    Easy,
    /// 6 seconds per question.
    Medium,
    /// 4 seconds per question.
    Hard,
}

impl From<DifficultyDto> for Difficulty {
    fn from(value: DifficultyDto) -> Self {
        match value {
            DifficultyDto::Easy => Difficulty::Easy,
            DifficultyDto::Medium => Difficulty::Medium,
            DifficultyDto::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyDto {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyDto::Easy,
            Difficulty::Medium => DifficultyDto::Medium,
            Difficulty::Hard => DifficultyDto::Hard,
        }
    }
}

/// Payload selecting an answer for the current question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectAnswerRequest {
    /// Position of the picked answer in the presented answer list.
    pub answer_index: usize,
}

/// Correctness marker attached to answers once the question was answered.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// This is the correct answer.
    Correct,
    /// This is a wrong answer.
    Wrong,
}

/// One answer option as presented to the client.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct AnswerOptionView {
    /// Display text.
    pub text: String,
    /// Correctness marker; only present once the question was answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AnswerStatus>,
}

/// Projection of the current question for clients.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct QuestionView {
    /// Prompt shown to the player.
    pub prompt: String,
    /// Answer options in presentation order.
    pub answers: Vec<AnswerOptionView>,
}

impl QuestionView {
    /// Project a question, revealing per-answer correctness only when `revealed` is set.
    pub fn from_question(question: &Question, revealed: bool) -> Self {
        Self {
            prompt: question.prompt.clone(),
            answers: question
                .answers
                .iter()
                .map(|answer| AnswerOptionView {
                    text: answer.text.clone(),
                    status: revealed.then_some(if answer.correct {
                        AnswerStatus::Correct
                    } else {
                        AnswerStatus::Wrong
                    }),
                })
                .collect(),
        }
    }
}

/// Read-only snapshot of the whole session returned after every action.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SessionSnapshot {
    /// Current lifecycle phase.
    pub phase: VisiblePhase,
    /// Seconds left on the countdown; null when no timer is set ("--" display).
    pub time_remaining: Option<u32>,
    /// True while the countdown is at or below the low-time threshold.
    pub low_time_warning: bool,
    /// Runtime identifier of the session, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Question currently presented; correctness revealed only after answering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    /// Zero-based index of the current question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_index: Option<usize>,
    /// Total number of questions in the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
    /// Correct answers so far (final score once ended).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Difficulty the session was started at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<DifficultyDto>,
    /// RFC 3339 timestamp of when the session was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl SessionSnapshot {
    /// Snapshot shape for the idle phase with no session data.
    pub fn empty() -> Self {
        Self {
            phase: VisiblePhase::Idle,
            time_remaining: None,
            low_time_warning: false,
            session_id: None,
            current_question: None,
            current_index: None,
            total_questions: None,
            score: None,
            difficulty: None,
            started_at: None,
        }
    }

    /// Fill the session-derived fields from the active session.
    ///
    /// The current question is exposed only during gameplay phases; once the
    /// session has ended only the final score and totals remain visible.
    pub fn with_session(mut self, session: &QuizSession, phase: VisiblePhase) -> Self {
        self.session_id = Some(session.id);
        self.current_index = Some(session.current_index);
        self.total_questions = Some(session.total_questions());
        self.score = Some(session.score.current());
        self.difficulty = Some(session.difficulty.into());
        self.started_at = Some(format_system_time(session.created_at));

        if matches!(phase, VisiblePhase::Playing | VisiblePhase::Paused) {
            self.current_question = session
                .current_question()
                .map(|question| QuestionView::from_question(question, session.answered_current));
        }

        self
    }
}

/// Minimal acknowledgement returned by actions without richer payloads.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human-readable outcome message.
    pub message: String,
}
