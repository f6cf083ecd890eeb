// crates/geyser-economics/src/config.rs
//
// Pool configuration.
// Loaded from a TOML table or populated with sensible defaults, then
// validated into the immutable `PoolParams` the engine runs on.

use std::fs;

use geyser_core::{FeePolicy, GeyserError};
use serde::{Deserialize, Serialize};

use crate::fee::{EvenUnitFee, FlatPercentFee, NoFee, BASIS_POINTS};
use crate::rewards::BonusCurve;

/// Which deposit fee rule the pool applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSchedule {
    /// 1% rounded down to an even unit.
    #[default]
    Even,
    /// `flat_fee_bp` basis points, truncating.
    Flat,
    /// No fee.
    None,
}

/// Pool configuration as written in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Bonus fraction paid for a zero-second hold, in basis points.
    #[serde(default = "default_start_bonus_bp")]
    pub start_bonus_bp: u32,

    /// Seconds for the bonus to rise linearly to 100%.
    #[serde(default = "default_bonus_period_sec")]
    pub bonus_period_sec: u64,

    /// Shares minted per net token for the first staker.
    #[serde(default = "default_initial_shares_per_token")]
    pub initial_shares_per_token: u64,

    /// Seconds the most recent stake must age before any unstake.
    #[serde(default = "default_lockup_sec")]
    pub lockup_sec: u64,

    /// Upper bound on open stake entries per account.
    #[serde(default = "default_max_stakes_per_account")]
    pub max_stakes_per_account: usize,

    /// Deposit fee rule.
    #[serde(default)]
    pub fee: FeeSchedule,

    /// Basis points withheld when `fee = "flat"`.
    #[serde(default = "default_flat_fee_bp")]
    pub flat_fee_bp: u32,
}

fn default_start_bonus_bp() -> u32 {
    3_300
}

fn default_bonus_period_sec() -> u64 {
    // 60 days
    5_184_000
}

fn default_initial_shares_per_token() -> u64 {
    1_000_000
}

fn default_lockup_sec() -> u64 {
    86_400
}

fn default_max_stakes_per_account() -> usize {
    1_024
}

fn default_flat_fee_bp() -> u32 {
    100
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            start_bonus_bp: default_start_bonus_bp(),
            bonus_period_sec: default_bonus_period_sec(),
            initial_shares_per_token: default_initial_shares_per_token(),
            lockup_sec: default_lockup_sec(),
            max_stakes_per_account: default_max_stakes_per_account(),
            fee: FeeSchedule::default(),
            flat_fee_bp: default_flat_fee_bp(),
        }
    }
}

impl PoolConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, GeyserError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| GeyserError::Config(format!("cannot read {}: {}", path, e)))?;
        let config: PoolConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate into engine parameters.
    pub fn params(&self) -> Result<PoolParams, GeyserError> {
        let params = PoolParams {
            start_bonus_bp: self.start_bonus_bp,
            bonus_period_sec: self.bonus_period_sec,
            initial_shares_per_token: u128::from(self.initial_shares_per_token),
            lockup_sec: self.lockup_sec,
            max_stakes_per_account: self.max_stakes_per_account,
        };
        params.validate()?;
        Ok(params)
    }

    /// Build the configured fee policy.
    pub fn fee_policy(&self) -> Result<Box<dyn FeePolicy>, GeyserError> {
        Ok(match self.fee {
            FeeSchedule::Even => Box::new(EvenUnitFee),
            FeeSchedule::Flat => Box::new(FlatPercentFee::new(self.flat_fee_bp)?),
            FeeSchedule::None => Box::new(NoFee),
        })
    }
}

/// Validated, immutable engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub start_bonus_bp: u32,
    pub bonus_period_sec: u64,
    pub initial_shares_per_token: u128,
    pub lockup_sec: u64,
    pub max_stakes_per_account: usize,
}

impl PoolParams {
    /// Check every parameter against its allowed range.
    ///
    /// # Errors
    /// Returns `GeyserError::InvalidInput` naming the first offending value.
    pub fn validate(&self) -> Result<(), GeyserError> {
        if u128::from(self.start_bonus_bp) > BASIS_POINTS {
            return Err(GeyserError::InvalidInput(format!(
                "start_bonus_bp {} exceeds {}",
                self.start_bonus_bp, BASIS_POINTS
            )));
        }
        if self.bonus_period_sec == 0 {
            return Err(GeyserError::InvalidInput(
                "bonus_period_sec must be greater than zero".to_string(),
            ));
        }
        if self.initial_shares_per_token == 0 {
            return Err(GeyserError::InvalidInput(
                "initial_shares_per_token must be greater than zero".to_string(),
            ));
        }
        if self.max_stakes_per_account == 0 {
            return Err(GeyserError::InvalidInput(
                "max_stakes_per_account must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The bonus curve described by these parameters.
    pub fn bonus_curve(&self) -> Result<BonusCurve, GeyserError> {
        BonusCurve::new(self.start_bonus_bp, self.bonus_period_sec)
    }
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            start_bonus_bp: default_start_bonus_bp(),
            bonus_period_sec: default_bonus_period_sec(),
            initial_shares_per_token: u128::from(default_initial_shares_per_token()),
            lockup_sec: default_lockup_sec(),
            max_stakes_per_account: default_max_stakes_per_account(),
        }
    }
}
