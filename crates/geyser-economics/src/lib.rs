// crates/geyser-economics/src/lib.rs
//
// geyser-economics: time-weighted staking share accounting, bonus-curve
// rewards, fee policies, and in-memory custody for the Geyser staking pool.
//
// Stakers deposit the staking token and receive internal staking shares.
// Shares accrue share-seconds while held; on unstake, the most recently
// staked shares are redeemed first and each redeemed chunk earns its
// proportional slice of the unlocked reward pool, scaled by a bonus curve
// that rises linearly from the start bonus to 100% over the bonus period.

pub mod config;
pub mod engine;
pub mod escrow;
pub mod fee;
pub mod math;
pub mod rewards;
pub mod shared;
pub mod staking;
pub mod token;
pub mod treasury;

// Re-export key types for ergonomic access from downstream crates.
pub use config::{FeeSchedule, PoolConfig, PoolParams};
pub use engine::{
    AccountSummary, AccountTotals, AccountingEngine, AccountingSnapshot, GlobalTotals,
    PoolSummary, StakeReceipt, UnstakeReceipt,
};
pub use escrow::BankEscrow;
pub use fee::{EvenUnitFee, FlatPercentFee, NoFee, BASIS_POINTS};
pub use rewards::{BonusCurve, RewardContext};
pub use shared::SharedEngine;
pub use staking::{Redemption, RedeemedChunk, StakeEntry, StakeLedger};
pub use token::{format_amount, TokenBank};
pub use treasury::PrincipalTreasury;
