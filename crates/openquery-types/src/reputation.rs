//! Responder reputation and stake-tier collateral bands
//!
//! Reputation is the only persistent cross-question state a responder
//! carries. It is unbounded in both directions and feeds back into the
//! collateral a responder must lock on future answers.

use crate::{ActorId, Amount};
use serde::{Deserialize, Serialize};

/// Reputation delta for an accepted answer
pub const REPUTATION_ACCEPT: i64 = 10;

/// Reputation delta for a rejected answer
pub const REPUTATION_REJECT: i64 = -5;

/// Reputation delta when a selected answer times out
pub const REPUTATION_TIMEOUT: i64 = -1;

/// Per-responder settlement statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// The responder these stats belong to
    pub responder: ActorId,
    /// Answers settled by acceptance
    pub accepted: u64,
    /// Answers settled by rejection
    pub rejected: u64,
    /// Selected answers that timed out
    pub timed_out: u64,
    /// Total settled answers (accepted + rejected + timed_out)
    pub total: u64,
    /// Signed reputation score, unbounded in both directions
    pub reputation: i64,
}

impl UserStats {
    /// Fresh stats for a responder
    pub fn new(responder: ActorId) -> Self {
        Self {
            responder,
            accepted: 0,
            rejected: 0,
            timed_out: 0,
            total: 0,
            reputation: 0,
        }
    }

    /// Record an accepted answer
    pub fn record_accept(&mut self) {
        self.accepted += 1;
        self.total += 1;
        self.reputation += REPUTATION_ACCEPT;
    }

    /// Record a rejected answer
    pub fn record_reject(&mut self) {
        self.rejected += 1;
        self.total += 1;
        self.reputation += REPUTATION_REJECT;
    }

    /// Record a timed-out selected answer
    pub fn record_timeout(&mut self) {
        self.timed_out += 1;
        self.total += 1;
        self.reputation += REPUTATION_TIMEOUT;
    }
}

/// Collateral band derived from a responder's reputation
///
/// Bands are checked top-down: a reputation of 60 is `Trusted`, not
/// `Established`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeTier {
    /// Reputation >= 50: half the base stake
    Trusted,
    /// Reputation >= 20: three quarters of the base stake
    Established,
    /// Everything in between: the base stake
    Standard,
    /// Reputation <= -20: double the base stake
    Risky,
}

impl StakeTier {
    /// Determine the tier for a reputation score
    pub fn from_reputation(reputation: i64) -> Self {
        if reputation >= 50 {
            StakeTier::Trusted
        } else if reputation >= 20 {
            StakeTier::Established
        } else if reputation <= -20 {
            StakeTier::Risky
        } else {
            StakeTier::Standard
        }
    }

    /// The stake this tier requires, given the configured base stake
    pub fn required_stake(&self, base: Amount) -> Amount {
        match self {
            StakeTier::Trusted => base.halved(),
            StakeTier::Established => base.three_quarters(),
            StakeTier::Standard => base,
            StakeTier::Risky => base.doubled(),
        }
    }
}

impl Default for StakeTier {
    fn default() -> Self {
        StakeTier::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_band_boundaries() {
        assert_eq!(StakeTier::from_reputation(50), StakeTier::Trusted);
        assert_eq!(StakeTier::from_reputation(49), StakeTier::Established);
        assert_eq!(StakeTier::from_reputation(20), StakeTier::Established);
        assert_eq!(StakeTier::from_reputation(19), StakeTier::Standard);
        assert_eq!(StakeTier::from_reputation(-19), StakeTier::Standard);
        assert_eq!(StakeTier::from_reputation(-20), StakeTier::Risky);
        assert_eq!(StakeTier::from_reputation(-21), StakeTier::Risky);
    }

    #[test]
    fn test_trusted_beats_established() {
        // >= 50 takes priority over >= 20
        assert_eq!(StakeTier::from_reputation(75), StakeTier::Trusted);
    }

    #[test]
    fn test_required_stake_monotonically_non_increasing() {
        let base = Amount::new(1_000);
        let stakes: Vec<Amount> = [-21, -20, 19, 20, 49, 50]
            .iter()
            .map(|&rep| StakeTier::from_reputation(rep).required_stake(base))
            .collect();
        for pair in stakes.windows(2) {
            assert!(pair[1] <= pair[0], "stake must not increase with reputation");
        }
        assert_eq!(stakes[0], Amount::new(2_000));
        assert_eq!(stakes[5], Amount::new(500));
    }

    #[test]
    fn test_stats_counters() {
        let mut stats = UserStats::new(ActorId::new());
        stats.record_accept();
        stats.record_accept();
        stats.record_reject();
        stats.record_timeout();

        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.reputation, 2 * 10 - 5 - 1);
        assert_eq!(stats.total, stats.accepted + stats.rejected + stats.timed_out);
    }
}
