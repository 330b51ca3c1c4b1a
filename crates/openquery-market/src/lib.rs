//! OpenQuery Market - Escrow-settled question/answer marketplace
//!
//! Askers deposit funds with a question, responders post collateralized
//! answers, and one of three deterministic settlement outcomes releases the
//! escrowed funds:
//!
//! - **accept**: deposit minus fee plus the stake go to the responder
//! - **reject**: deposit minus fee plus the forfeited stake go to the asker
//! - **timeout**: both sides refunded minus the timeout fee
//!
//! A signed reputation score per responder feeds back into the collateral
//! required on future answers.
//!
//! # Lifecycle
//!
//! ```text
//! Open -> Selected -> Resolved   (accept)
//!              \____> Refunded   (reject, or timeout after the deadline)
//! ```
//!
//! Only selection starts the settlement clock; an open question with no
//! selected answer keeps its deposit locked until the asker acts.

pub use openquery_ledger::{
    AcceptPayout, EscrowLedger, InMemoryTransfer, RejectPayout, TimeoutPayout, ValueTransfer,
};
pub use openquery_types::{
    ActorId, Amount, Answer, AnswerId, MarketConfig, MarketError, Question, QuestionId,
    QuestionState, Result, StakeTier, UserStats,
};

pub mod clock;
pub mod marketplace;

pub use clock::{Clock, ManualClock, SystemClock};
pub use marketplace::Marketplace;
