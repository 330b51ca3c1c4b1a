//! Answer record
//!
//! Answers carry no explicit state field: they stay addressable forever,
//! and only the answer currently selected on the parent question can be
//! acted upon after selection.

use crate::{ActorId, Amount, AnswerId, QuestionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An answer submitted to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Unique id, derived from the submission inputs
    pub id: AnswerId,
    /// Parent question
    pub question_id: QuestionId,
    /// The answer text
    pub text: String,
    /// Identity that submitted the answer and funded the stake
    pub responder: ActorId,
    /// Collateral locked at submission; fixed
    pub stake: Amount,
    /// When the answer was submitted
    pub created_at: DateTime<Utc>,
}
