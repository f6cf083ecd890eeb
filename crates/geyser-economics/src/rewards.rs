// crates/geyser-economics/src/rewards.rs
//
// Reward computation with the early-withdrawal bonus curve.
//
// Each redeemed chunk of stake earns its proportional slice of the unlocked
// reward pool:
//
//   raw = total_unlocked * chunk_share_seconds / total_share_seconds
//
// and is then scaled by the bonus fraction for the chunk's own held
// duration. The fraction rises linearly from `start_bonus_bp` at zero
// seconds to 100% at `bonus_period_sec` and stays there:
//
//   bonus = start + (100% - start) * held / period     (held < period)
//   bonus = 100%                                        (held >= period)
//
// The bonus is evaluated per chunk, never on an aggregate duration.

use geyser_core::{Amount, GeyserError, ShareSeconds};
use serde::{Deserialize, Serialize};

use crate::fee::BASIS_POINTS;
use crate::math::{checked_add, mul_div};

/// Immutable bonus curve parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusCurve {
    start_bonus_bp: u128,
    bonus_period_sec: u64,
}

impl BonusCurve {
    /// Create a bonus curve.
    ///
    /// # Errors
    /// Returns `GeyserError::InvalidInput` if the start bonus exceeds 100%
    /// or the bonus period is zero.
    pub fn new(start_bonus_bp: u32, bonus_period_sec: u64) -> Result<Self, GeyserError> {
        let start_bonus_bp = u128::from(start_bonus_bp);
        if start_bonus_bp > BASIS_POINTS {
            return Err(GeyserError::InvalidInput(format!(
                "start bonus {} bp exceeds {} bp",
                start_bonus_bp, BASIS_POINTS
            )));
        }
        if bonus_period_sec == 0 {
            return Err(GeyserError::InvalidInput(
                "bonus period must be at least one second".to_string(),
            ));
        }
        Ok(Self {
            start_bonus_bp,
            bonus_period_sec,
        })
    }

    pub fn start_bonus_bp(&self) -> u128 {
        self.start_bonus_bp
    }

    pub fn bonus_period_sec(&self) -> u64 {
        self.bonus_period_sec
    }

    /// Bonus fraction in basis points for a chunk held `held_sec` seconds.
    pub fn bonus_bp(&self, held_sec: u64) -> u128 {
        if held_sec >= self.bonus_period_sec {
            return BASIS_POINTS;
        }
        // (10_000 - start) * held fits easily: < 2^14 * 2^64.
        self.start_bonus_bp
            + (BASIS_POINTS - self.start_bonus_bp) * u128::from(held_sec)
                / u128::from(self.bonus_period_sec)
    }

    /// Add the reward for one redeemed chunk to `current_accum`.
    ///
    /// # Errors
    /// - `InvariantViolation` if a nonzero chunk is redeemed while the pool
    ///   has no share-seconds at all.
    /// - `ArithmeticOverflow` if the accumulator overflows.
    pub fn compute_new_reward(
        &self,
        current_accum: Amount,
        share_seconds_chunk: ShareSeconds,
        chunk_duration_sec: u64,
        total_unlocked: Amount,
        total_share_seconds: ShareSeconds,
    ) -> Result<Amount, GeyserError> {
        if share_seconds_chunk == 0 {
            return Ok(current_accum);
        }
        if total_share_seconds == 0 {
            return Err(GeyserError::InvariantViolation(format!(
                "redeeming {} share-seconds from a pool with none",
                share_seconds_chunk
            )));
        }

        let raw = mul_div(total_unlocked, share_seconds_chunk, total_share_seconds)?;
        let earned = if chunk_duration_sec >= self.bonus_period_sec {
            raw
        } else {
            mul_div(raw, self.bonus_bp(chunk_duration_sec), BASIS_POINTS)?
        };
        checked_add(current_accum, earned, "reward accumulator")
    }
}

/// Pool-wide quantities frozen for the duration of one redemption.
#[derive(Debug, Clone, Copy)]
pub struct RewardContext {
    /// Reward pool balance.
    pub total_unlocked: Amount,
    /// Global share-seconds, already advanced to the redemption time.
    pub total_share_seconds: ShareSeconds,
    pub curve: BonusCurve,
}

impl RewardContext {
    /// See [`BonusCurve::compute_new_reward`].
    pub fn compute_new_reward(
        &self,
        current_accum: Amount,
        share_seconds_chunk: ShareSeconds,
        chunk_duration_sec: u64,
    ) -> Result<Amount, GeyserError> {
        self.curve.compute_new_reward(
            current_accum,
            share_seconds_chunk,
            chunk_duration_sec,
            self.total_unlocked,
            self.total_share_seconds,
        )
    }
}
