//! Marketplace configuration
//!
//! All knobs are owner-settable. Changes take effect only for future
//! operations: a settlement deadline fixed under an old window is never
//! recomputed.

use crate::{Amount, MarketError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Owner-settable marketplace configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Platform fee on acceptance, in basis points (0-10000)
    pub fee_accept_bps: u16,
    /// Platform fee on rejection, in basis points (0-10000)
    pub fee_reject_bps: u16,
    /// Platform fee on timeout, in basis points (0-10000)
    pub fee_timeout_bps: u16,
    /// Base collateral a Standard-tier responder must lock
    pub base_stake: Amount,
    /// Settlement window after selection, in seconds
    pub mutual_timeout_secs: i64,
    /// Minimum deposit an asker must lock with a question
    pub min_deposit: Amount,
}

impl MarketConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (field, bps) in [
            ("fee_accept_bps", self.fee_accept_bps),
            ("fee_reject_bps", self.fee_reject_bps),
            ("fee_timeout_bps", self.fee_timeout_bps),
        ] {
            if bps > 10_000 {
                return Err(MarketError::invalid_input(
                    field,
                    format!("{} exceeds 10000 basis points", bps),
                ));
            }
        }
        if self.mutual_timeout_secs <= 0 {
            return Err(MarketError::invalid_input(
                "mutual_timeout_secs",
                "settlement window must be positive",
            ));
        }
        if self.base_stake.is_zero() {
            return Err(MarketError::invalid_input(
                "base_stake",
                "base stake must be positive",
            ));
        }
        Ok(())
    }

    /// The settlement window as a chrono duration
    pub fn settlement_window(&self) -> Duration {
        Duration::seconds(self.mutual_timeout_secs)
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            fee_accept_bps: 500,   // 5%
            fee_reject_bps: 1_000, // 10%
            fee_timeout_bps: 500,  // 5%
            base_stake: Amount::new(1_000),
            mutual_timeout_secs: 72 * 3600,
            min_deposit: Amount::new(100),
        }
    }
}
