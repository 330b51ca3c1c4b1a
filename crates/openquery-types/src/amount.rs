//! Single-asset amount type with basis-point fee arithmetic
//!
//! Fund arithmetic is integer-only. Fees are computed in basis points
//! (10000 = 100%) with floor division, so results are bit-exact and
//! reproducible. The division remainder always stays with the payee side.

use crate::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis-point denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// An amount of the marketplace asset, in smallest units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    /// Create a new amount from smallest units
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    /// Zero amount
    pub fn zero() -> Self {
        Self(0)
    }

    /// Raw value in smallest units
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MarketError::AmountOverflow)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MarketError::AmountOverflow)
    }

    /// Halve the amount (floor)
    pub fn halved(self) -> Self {
        Self(self.0 / 2)
    }

    /// Three quarters of the amount (floor, overflow-safe)
    pub fn three_quarters(self) -> Self {
        Self(self.0 / 4 * 3 + self.0 % 4 * 3 / 4)
    }

    /// Double the amount, saturating at the maximum representable value
    pub fn doubled(self) -> Self {
        Self(self.0.saturating_mul(2))
    }

    /// Split this amount into `(fee, remainder)` at the given basis-point
    /// rate.
    ///
    /// `fee = value * bps / 10000` with floor division; the remainder is
    /// `value - fee`, so the rounding residue stays with the payee.
    pub fn split_fee(self, bps: u16) -> Result<FeeSplit> {
        if u128::from(bps) > BPS_DENOMINATOR {
            return Err(MarketError::invalid_input(
                "bps",
                format!("fee rate {} exceeds {} basis points", bps, BPS_DENOMINATOR),
            ));
        }
        let fee = self
            .0
            .checked_mul(u128::from(bps))
            .ok_or(MarketError::AmountOverflow)?
            / BPS_DENOMINATOR;
        Ok(FeeSplit {
            fee: Self(fee),
            remainder: Self(self.0 - fee),
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of splitting an amount at a basis-point fee rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// The fee share (goes to the fee receiver)
    pub fee: Amount,
    /// Everything else (goes to the payee)
    pub remainder: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(100);
        let b = Amount::new(40);
        assert_eq!(a.checked_add(b).unwrap(), Amount::new(140));
        assert_eq!(a.checked_sub(b).unwrap(), Amount::new(60));
        assert!(b.checked_sub(a).is_err());
        assert!(Amount::new(u128::MAX).checked_add(Amount::new(1)).is_err());
    }

    #[test]
    fn test_split_fee_exact() {
        let split = Amount::new(10_000).split_fee(500).unwrap();
        assert_eq!(split.fee, Amount::new(500));
        assert_eq!(split.remainder, Amount::new(9_500));
    }

    #[test]
    fn test_split_fee_conserves_value() {
        for deposit in [1u128, 3, 7, 9_999, 10_000, 123_457] {
            for bps in [0u16, 1, 499, 500, 9_999, 10_000] {
                let split = Amount::new(deposit).split_fee(bps).unwrap();
                assert_eq!(
                    split.fee.checked_add(split.remainder).unwrap(),
                    Amount::new(deposit)
                );
            }
        }
    }

    #[test]
    fn test_split_fee_residue_goes_to_payee() {
        // 999 * 500 / 10000 = 49.95 -> floor 49; payee keeps the 0.95
        let split = Amount::new(999).split_fee(500).unwrap();
        assert_eq!(split.fee, Amount::new(49));
        assert_eq!(split.remainder, Amount::new(950));
    }

    #[test]
    fn test_split_fee_rejects_rate_above_denominator() {
        assert!(Amount::new(100).split_fee(10_001).is_err());
    }

    #[test]
    fn test_stake_scaling() {
        let base = Amount::new(1_000);
        assert_eq!(base.halved(), Amount::new(500));
        assert_eq!(base.three_quarters(), Amount::new(750));
        assert_eq!(base.doubled(), Amount::new(2_000));
    }
}
