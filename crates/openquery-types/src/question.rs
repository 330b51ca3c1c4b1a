//! Question record and lifecycle state machine
//!
//! A question moves `Open -> Selected -> {Resolved | Refunded}`. Terminal
//! states are permanent markers; questions are never deleted.

use crate::{ActorId, Amount, AnswerId, QuestionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionState {
    /// Accepting answers; deposit locked, nothing selected yet
    Open,
    /// An answer has been tentatively selected; settlement window running
    Selected,
    /// Settled by acceptance; deposit paid out to the responder
    Resolved,
    /// Settled by rejection or timeout; deposit refunded to the asker
    Refunded,
}

impl QuestionState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Refunded)
    }

    /// Check if the question still accepts new answers.
    ///
    /// Late answers are accepted up until resolution, including while an
    /// answer is already tentatively selected.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::Open | Self::Selected)
    }
}

/// A question in the marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique id, derived from asker, text, and creation time
    pub id: QuestionId,
    /// The question text
    pub text: String,
    /// Identity that posted the question and funded the deposit
    pub asker: ActorId,
    /// Deposit locked at creation; fixed, never increases
    pub deposit: Amount,
    /// Current lifecycle state
    pub state: QuestionState,
    /// The currently selected answer, if any
    pub selected_answer: Option<AnswerId>,
    /// Settlement deadline, fixed when an answer is selected
    pub deadline: Option<DateTime<Utc>>,
    /// When the question was created
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Check whether the settlement deadline exists and has passed
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.deadline, Some(deadline) if now > deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!QuestionState::Open.is_terminal());
        assert!(!QuestionState::Selected.is_terminal());
        assert!(QuestionState::Resolved.is_terminal());
        assert!(QuestionState::Refunded.is_terminal());
    }

    #[test]
    fn test_accepts_answers() {
        assert!(QuestionState::Open.accepts_answers());
        assert!(QuestionState::Selected.accepts_answers());
        assert!(!QuestionState::Resolved.accepts_answers());
        assert!(!QuestionState::Refunded.accepts_answers());
    }

    #[test]
    fn test_question_serde_roundtrip() {
        let asker = ActorId::new();
        let now = Utc::now();
        let question = Question {
            id: QuestionId::derive(&asker, "q", now),
            text: "q".to_string(),
            asker,
            deposit: Amount::new(1_000),
            state: QuestionState::Selected,
            selected_answer: None,
            deadline: Some(now),
            created_at: now,
        };

        let json = serde_json::to_string(&question).unwrap();
        let decoded: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(question, decoded);
    }

    #[test]
    fn test_deadline_passed() {
        let asker = ActorId::new();
        let now = Utc::now();
        let mut question = Question {
            id: QuestionId::derive(&asker, "q", now),
            text: "q".to_string(),
            asker,
            deposit: Amount::new(1_000),
            state: QuestionState::Open,
            selected_answer: None,
            deadline: None,
            created_at: now,
        };

        assert!(!question.deadline_passed(now));

        question.deadline = Some(now);
        assert!(!question.deadline_passed(now));
        assert!(question.deadline_passed(now + chrono::Duration::seconds(1)));
    }
}
