//! Error types for OpenQuery
//!
//! All errors are synchronous and fail the whole operation; no settlement
//! path ever leaves a partial marketplace-state mutation behind.

use thiserror::Error;

/// Result type for OpenQuery operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// OpenQuery error taxonomy
#[derive(Debug, Clone, Error)]
pub enum MarketError {
    /// Empty text, non-positive amount, amount below a configured minimum
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Unknown question identifier
    #[error("Question {question_id} not found")]
    QuestionNotFound { question_id: String },

    /// Unknown answer identifier
    #[error("Answer {answer_id} not found")]
    AnswerNotFound { answer_id: String },

    /// Caller is not the required owner or authorized component
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Operation attempted outside its required lifecycle state or window
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// Settlement attempted on an already-paid or never-funded balance
    #[error("Empty balance for {id}")]
    EmptyBalance { id: String },

    /// External value transfer did not confirm success
    #[error("Transfer to {to} failed: {reason}")]
    TransferFailed { to: String, reason: String },

    /// Overflow during checked fund arithmetic
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,
}

impl MarketError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Create an empty balance error
    pub fn empty_balance(id: impl ToString) -> Self {
        Self::EmptyBalance { id: id.to_string() }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::QuestionNotFound { .. } => "QUESTION_NOT_FOUND",
            Self::AnswerNotFound { .. } => "ANSWER_NOT_FOUND",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::EmptyBalance { .. } => "EMPTY_BALANCE",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MarketError::empty_balance("q_deadbeef");
        assert_eq!(err.error_code(), "EMPTY_BALANCE");

        let err = MarketError::unauthorized("caller is not the question owner");
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_error_display() {
        let err = MarketError::invalid_input("deposit", "below minimum");
        assert_eq!(err.to_string(), "Invalid input: deposit - below minimum");
    }
}
