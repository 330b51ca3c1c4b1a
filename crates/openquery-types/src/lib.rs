//! OpenQuery Types - Canonical domain types for the escrow-settled Q&A marketplace
//!
//! This crate contains the foundational types for OpenQuery with zero
//! dependencies on other openquery crates:
//!
//! - Identity types (ActorId, QuestionId, AnswerId)
//! - Single-asset Amount with basis-point fee splitting
//! - Question/Answer records and the lifecycle state machine
//! - Reputation stats and the stake-tier collateral bands
//! - Marketplace configuration
//! - The error taxonomy shared by ledger and marketplace
//!
//! # Invariants
//!
//! 1. A question's deposit is fixed at creation and never increases
//! 2. Question state only moves forward, never back
//! 3. An answer's stake is fixed at submission
//! 4. Fee arithmetic is integer basis points with floor division; the
//!    rounding residue accrues to the payee, never the fee receiver

pub mod amount;
pub mod answer;
pub mod config;
pub mod error;
pub mod identity;
pub mod question;
pub mod reputation;

pub use amount::*;
pub use answer::*;
pub use config::*;
pub use error::*;
pub use identity::*;
pub use question::*;
pub use reputation::*;

/// Version of the OpenQuery types schema
pub const TYPES_VERSION: &str = "0.1.0";
