use std::time::SystemTime;

use rand::{rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{error::ServiceError, provider::models::QuestionRecord};

/// Difficulty selected for a session; fixes the per-question time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// 8 seconds per question.
    Easy,
    /// 6 seconds per question.
    Medium,
    /// 4 seconds per question.
    Hard,
}

impl Difficulty {
    /// Seconds granted per question at this difficulty.
    pub fn per_question_seconds(self) -> u32 {
        match self {
            Difficulty::Easy => 8,
            Difficulty::Medium => 6,
            Difficulty::Hard => 4,
        }
    }

    /// Identifier understood by the question provider.
    pub fn provider_id(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// One selectable answer of a question.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Display text.
    pub text: String,
    /// Whether picking this answer scores the question.
    pub correct: bool,
}

/// A question with its shuffled answer list. Immutable once built.
#[derive(Debug, Clone)]
pub struct Question {
    /// Prompt shown to the player.
    pub prompt: String,
    /// Answers in presentation order; exactly one is correct.
    pub answers: Vec<Answer>,
}

impl Question {
    /// Build a question from a provider record.
    ///
    /// The answer list is assembled as the single correct answer plus all
    /// incorrect ones, then shuffled so the correct answer's position is not
    /// deterministic.
    pub fn from_record(record: QuestionRecord) -> Self {
        let QuestionRecord {
            question,
            correct_answer,
            incorrect_answers,
        } = record;

        let mut answers = Vec::with_capacity(1 + incorrect_answers.len());
        answers.push(Answer {
            text: correct_answer,
            correct: true,
        });
        answers.extend(incorrect_answers.into_iter().map(|text| Answer {
            text,
            correct: false,
        }));

        if answers.len() > 1 {
            let mut rng = rng();
            answers.shuffle(&mut rng);
        }

        Self {
            prompt: question,
            answers,
        }
    }

    /// Position of the correct answer in the shuffled list.
    pub fn correct_index(&self) -> Option<usize> {
        self.answers.iter().position(|answer| answer.correct)
    }
}

/// Correct-answer counter for a session. Starts at zero, never decrements.
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    correct: u32,
}

impl ScoreTracker {
    /// Create a tracker at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one answered question, counting it iff it was correct.
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct += 1;
        }
    }

    /// Number of correctly answered questions so far.
    pub fn current(&self) -> u32 {
        self.correct
    }
}

/// Aggregated state for an in-progress quiz session.
///
/// Owned exclusively by the shared application state; every mutation goes
/// through a controller entry point.
#[derive(Debug, Clone)]
pub struct QuizSession {
    /// Runtime identifier for the session.
    pub id: Uuid,
    /// Provider category identifier the questions were fetched with.
    pub category: String,
    /// Difficulty the session was started at.
    pub difficulty: Difficulty,
    /// Questions in play order, fixed once the session starts.
    pub questions: Vec<Question>,
    /// Index of the question currently presented.
    pub current_index: usize,
    /// Correct-answer counter.
    pub score: ScoreTracker,
    /// Whether the current question has already been answered.
    pub answered_current: bool,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
}

impl QuizSession {
    /// Build a new in-memory session from fetched provider records.
    ///
    /// Per-question answer lists are shuffled by [`Question::from_record`];
    /// the question order itself is shuffled once here so a fresh session
    /// starts with a randomized sequence.
    pub fn new(category: String, difficulty: Difficulty, records: Vec<QuestionRecord>) -> Self {
        let mut questions: Vec<Question> =
            records.into_iter().map(Question::from_record).collect();

        if questions.len() > 1 {
            let mut rng = rng();
            questions.shuffle(&mut rng);
        }

        Self {
            id: Uuid::new_v4(),
            category,
            difficulty,
            questions,
            current_index: 0,
            score: ScoreTracker::new(),
            answered_current: false,
            created_at: SystemTime::now(),
        }
    }

    /// Total countdown seconds for this session: question count times the
    /// difficulty's per-question budget.
    pub fn initial_time_budget(&self) -> u32 {
        self.questions.len() as u32 * self.difficulty.per_question_seconds()
    }

    /// Number of questions in the session.
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// The question currently presented, if the index is in range.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Whether the current question is the last one.
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Record the player's pick for the current question and return whether
    /// it was correct.
    ///
    /// Fails when the question was already answered or the index does not
    /// name an answer of the current question.
    pub fn record_answer(&mut self, answer_index: usize) -> Result<bool, ServiceError> {
        if self.answered_current {
            return Err(ServiceError::InvalidState(
                "current question has already been answered".into(),
            ));
        }

        let question = self.questions.get(self.current_index).ok_or_else(|| {
            ServiceError::InvalidState("no question at the current index".into())
        })?;

        let answer = question.answers.get(answer_index).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "answer index {answer_index} out of range (question has {} answers)",
                question.answers.len()
            ))
        })?;

        let correct = answer.correct;
        self.score.record(correct);
        self.answered_current = true;
        Ok(correct)
    }

    /// Move to the next question after the current one was answered.
    /// Returns false when nothing was advanced (unanswered or last question).
    pub fn advance(&mut self) -> bool {
        if !self.answered_current || self.is_last_question() {
            return false;
        }

        self.current_index += 1;
        self.answered_current = false;
        true
    }

    /// Reset the session for a replay with the same questions: fresh shuffle,
    /// score and index back to zero.
    pub fn reshuffle_for_restart(&mut self) {
        if self.questions.len() > 1 {
            let mut rng = rng();
            self.questions.shuffle(&mut rng);
        }
        self.current_index = 0;
        self.score = ScoreTracker::new();
        self.answered_current = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(prompt: &str) -> QuestionRecord {
        QuestionRecord {
            question: prompt.to_string(),
            correct_answer: "right".to_string(),
            incorrect_answers: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    fn session(count: usize, difficulty: Difficulty) -> QuizSession {
        let records = (0..count).map(|i| record(&format!("q{i}"))).collect();
        QuizSession::new("9".into(), difficulty, records)
    }

    #[test]
    fn time_budget_scales_with_difficulty() {
        assert_eq!(session(10, Difficulty::Easy).initial_time_budget(), 80);
        assert_eq!(session(10, Difficulty::Medium).initial_time_budget(), 60);
        assert_eq!(session(10, Difficulty::Hard).initial_time_budget(), 40);
        assert_eq!(session(3, Difficulty::Medium).initial_time_budget(), 18);
    }

    #[test]
    fn exactly_one_correct_answer_survives_shuffling() {
        for _ in 0..50 {
            let question = Question::from_record(record("q"));
            let correct = question.answers.iter().filter(|a| a.correct).count();
            assert_eq!(correct, 1);
            assert_eq!(question.answers.len(), 4);
        }
    }

    #[test]
    fn correct_answer_position_is_not_deterministic() {
        let seen_elsewhere = (0..50)
            .map(|_| Question::from_record(record("q")))
            .any(|q| q.correct_index() != Some(0));
        assert!(seen_elsewhere, "correct answer was always first");
    }

    #[test]
    fn question_order_is_a_permutation() {
        let session = session(10, Difficulty::Easy);
        let mut prompts: Vec<_> = session
            .questions
            .iter()
            .map(|q| q.prompt.clone())
            .collect();
        prompts.sort();
        let expected: Vec<_> = (0..10).map(|i| format!("q{i}")).collect();
        assert_eq!(prompts, expected);
    }

    #[test]
    fn score_counts_only_correct_answers() {
        let mut tracker = ScoreTracker::new();
        tracker.record(true);
        tracker.record(false);
        tracker.record(true);
        assert_eq!(tracker.current(), 2);
    }

    #[test]
    fn record_answer_flags_and_scores() {
        let mut session = session(3, Difficulty::Medium);
        let correct_index = session.current_question().unwrap().correct_index().unwrap();

        assert!(session.record_answer(correct_index).unwrap());
        assert!(session.answered_current);
        assert_eq!(session.score.current(), 1);

        // Second pick on the same question is rejected.
        assert!(session.record_answer(correct_index).is_err());
        assert_eq!(session.score.current(), 1);
    }

    #[test]
    fn record_answer_rejects_out_of_range_index() {
        let mut session = session(1, Difficulty::Easy);
        assert!(session.record_answer(99).is_err());
        assert!(!session.answered_current);
    }

    #[test]
    fn advance_requires_an_answer_and_a_next_question() {
        let mut session = session(2, Difficulty::Easy);
        assert!(!session.advance());

        session.record_answer(0).unwrap();
        assert!(session.advance());
        assert_eq!(session.current_index, 1);
        assert!(!session.answered_current);
        assert!(session.is_last_question());

        session.record_answer(0).unwrap();
        assert!(!session.advance());
        assert_eq!(session.current_index, 1);
    }

    #[test]
    fn score_never_exceeds_answered_questions() {
        let mut session = session(5, Difficulty::Easy);
        let mut answered = 0u32;

        loop {
            let pick = session.current_question().unwrap().correct_index().unwrap();
            session.record_answer(pick).unwrap();
            answered += 1;
            assert!(session.score.current() <= answered);
            assert!(answered as usize <= session.total_questions());
            if !session.advance() {
                break;
            }
        }

        assert_eq!(answered, 5);
    }

    #[test]
    fn restart_resets_progress_and_keeps_questions() {
        let mut session = session(4, Difficulty::Hard);
        session.record_answer(0).unwrap();
        session.advance();
        session.record_answer(0).unwrap();

        let before: Vec<_> = session.questions.iter().map(|q| q.prompt.clone()).collect();
        session.reshuffle_for_restart();

        assert_eq!(session.current_index, 0);
        assert_eq!(session.score.current(), 0);
        assert!(!session.answered_current);

        let mut after: Vec<_> = session.questions.iter().map(|q| q.prompt.clone()).collect();
        let mut sorted_before = before;
        sorted_before.sort();
        after.sort();
        assert_eq!(after, sorted_before);
    }
}
