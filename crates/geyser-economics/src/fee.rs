// crates/geyser-economics/src/fee.rs
//
// Deposit fee policies.
//
// The fee is taken off the share-minting basis only: the gross deposit
// still lands in the staking escrow, so the withheld part accrues as value
// to every existing shareholder.
//
//   - EvenUnitFee:    1%, rounded down to an even unit (half-fee doubled)
//   - FlatPercentFee: `bp` basis points, truncating division
//   - NoFee:          credits the full deposit

use geyser_core::{Amount, FeePolicy, GeyserError};

/// 100% expressed in basis points.
pub const BASIS_POINTS: u128 = 10_000;

/// Default policy: withhold 1% rounded down to an even number of units.
///
/// Computes half of the fee (0.5%) with truncating division, then doubles
/// it, so the withheld amount is always even and never rounds up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvenUnitFee;

impl FeePolicy for EvenUnitFee {
    fn apply_fee(&self, amount: Amount) -> Amount {
        let half_fee = amount / 200;
        amount - half_fee * 2
    }

    fn name(&self) -> &'static str {
        "even"
    }
}

/// Withhold a fixed fraction of each deposit, truncated toward zero.
#[derive(Debug, Clone, Copy)]
pub struct FlatPercentFee {
    bp: u128,
}

impl FlatPercentFee {
    /// The 1% preset.
    pub const ONE_PERCENT: FlatPercentFee = FlatPercentFee { bp: 100 };

    /// Create a flat fee of `bp` basis points.
    ///
    /// # Errors
    /// Returns `GeyserError::InvalidInput` if `bp` exceeds 10,000 (100%).
    pub fn new(bp: u32) -> Result<Self, GeyserError> {
        let bp = u128::from(bp);
        if bp > BASIS_POINTS {
            return Err(GeyserError::InvalidInput(format!(
                "flat fee of {} bp exceeds {} bp",
                bp, BASIS_POINTS
            )));
        }
        Ok(Self { bp })
    }
}

impl FeePolicy for FlatPercentFee {
    fn apply_fee(&self, amount: Amount) -> Amount {
        // floor(amount * bp / 10_000) without forming the full product.
        let whole = amount / BASIS_POINTS;
        let rest = amount % BASIS_POINTS;
        let fee = whole * self.bp + rest * self.bp / BASIS_POINTS;
        amount - fee
    }

    fn name(&self) -> &'static str {
        "flat"
    }
}

/// Credit the full deposit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFee;

impl FeePolicy for NoFee {
    fn apply_fee(&self, amount: Amount) -> Amount {
        amount
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_fee_on_round_amount() {
        assert_eq!(EvenUnitFee.apply_fee(1_000), 990);
        assert_eq!(EvenUnitFee.apply_fee(200), 198);
        // 1% of 100 is a single unit, which rounds down to zero.
        assert_eq!(EvenUnitFee.apply_fee(100), 100);
    }

    #[test]
    fn test_even_fee_rounds_down_to_even_unit() {
        // 1% of 399 is 3.99; half-fee is 1, so 2 is withheld.
        assert_eq!(EvenUnitFee.apply_fee(399), 397);
        // Below 200 units the half-fee truncates to zero.
        assert_eq!(EvenUnitFee.apply_fee(199), 199);
        assert_eq!(EvenUnitFee.apply_fee(1), 1);
    }

    #[test]
    fn test_flat_fee_truncates() {
        let fee = FlatPercentFee::ONE_PERCENT;
        assert_eq!(fee.apply_fee(1_000), 990);
        assert_eq!(fee.apply_fee(399), 396);
        assert_eq!(fee.apply_fee(99), 99);
    }

    #[test]
    fn test_flat_fee_matches_naive_formula() {
        let fee = FlatPercentFee::new(250).unwrap();
        for amount in [0u128, 1, 39, 40, 12_345, 10_000_001, 987_654_321] {
            assert_eq!(fee.apply_fee(amount), amount - amount * 250 / BASIS_POINTS);
        }
    }

    #[test]
    fn test_flat_fee_no_overflow_near_max() {
        let fee = FlatPercentFee::new(10_000).unwrap();
        assert_eq!(fee.apply_fee(u128::MAX), 0);
        let fee = FlatPercentFee::ONE_PERCENT;
        assert!(fee.apply_fee(u128::MAX) < u128::MAX);
    }

    #[test]
    fn test_flat_fee_rejects_over_100_percent() {
        assert!(FlatPercentFee::new(10_001).is_err());
    }

    #[test]
    fn test_no_fee() {
        assert_eq!(NoFee.apply_fee(1_000), 1_000);
    }

    #[test]
    fn test_net_never_exceeds_gross() {
        for amount in (0u128..5_000).step_by(7) {
            assert!(EvenUnitFee.apply_fee(amount) <= amount);
            assert!(FlatPercentFee::ONE_PERCENT.apply_fee(amount) <= amount);
        }
    }
}
