// crates/geyser-economics/src/staking.rs
//
// Per-account stake history and most-recent-first redemption.
//
// Every stake call appends one entry (shares, timestamp) to the caller's
// list. Unstaking walks the list from the tail: the most recently staked
// shares are redeemed first, so each redeemed chunk is rewarded against its
// own age. Fully consumed entries are popped; a partially consumed entry
// keeps its timestamp and shrinks its share count.

use std::collections::HashMap;

use geyser_core::{AccountId, Amount, GeyserError, ShareSeconds, Shares, Timestamp};
use serde::{Deserialize, Serialize};

use crate::math::{checked_add, checked_mul};
use crate::rewards::RewardContext;

/// A discrete stake: shares minted at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEntry {
    /// Shares still attributed to this stake.
    pub shares: Shares,
    /// Second at which the stake was made.
    pub timestamp: Timestamp,
}

/// One entry (or the redeemed part of one) consumed during an unstake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemedChunk {
    pub shares: Shares,
    pub share_seconds: ShareSeconds,
    /// Seconds between the entry's stake time and the redemption.
    pub held_sec: u64,
    /// Reward earned by this chunk after the bonus curve.
    pub reward: Amount,
}

/// Outcome of a most-recent-first burn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub shares_burned: Shares,
    pub share_seconds_burned: ShareSeconds,
    pub reward: Amount,
    /// Consumed chunks, most recent first.
    pub chunks: Vec<RedeemedChunk>,
}

/// Ordered stake history for every account.
#[derive(Debug, Clone, Default)]
pub struct StakeLedger {
    stakes: HashMap<AccountId, Vec<StakeEntry>>,
}

impl StakeLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            stakes: HashMap::new(),
        }
    }

    /// Add a new entry at the tail of `account`'s history.
    pub fn append(&mut self, account: &AccountId, shares: Shares, timestamp: Timestamp) {
        self.stakes
            .entry(account.clone())
            .or_default()
            .push(StakeEntry { shares, timestamp });
    }

    /// Stake history for `account`, oldest first. Empty if none.
    pub fn stakes_of(&self, account: &AccountId) -> &[StakeEntry] {
        self.stakes.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The most recent open stake for `account`.
    pub fn most_recent(&self, account: &AccountId) -> Option<&StakeEntry> {
        self.stakes.get(account).and_then(|s| s.last())
    }

    /// Number of open stake entries for `account`.
    pub fn open_stakes(&self, account: &AccountId) -> usize {
        self.stakes.get(account).map_or(0, Vec::len)
    }

    /// Replace `account`'s history wholesale. Used to roll back a failed call.
    pub fn restore(&mut self, account: &AccountId, entries: Vec<StakeEntry>) {
        if entries.is_empty() {
            self.stakes.remove(account);
        } else {
            self.stakes.insert(account.clone(), entries);
        }
    }

    /// Compute what [`burn_from_most_recent`](Self::burn_from_most_recent)
    /// would do, without mutating anything.
    pub fn preview_burn(
        &self,
        account: &AccountId,
        shares_to_burn: Shares,
        now: Timestamp,
        ctx: &RewardContext,
    ) -> Result<Redemption, GeyserError> {
        plan_burn(self.stakes_of(account), shares_to_burn, now, ctx)
    }

    /// Burn `shares_to_burn` from `account`, most recent entries first.
    ///
    /// Returns the share-seconds burned and the reward earned, with the bonus
    /// curve applied to each consumed entry at its own held duration.
    ///
    /// # Errors
    /// - `InvalidInput` if `shares_to_burn` is zero or an entry is dated
    ///   after `now`.
    /// - `InvariantViolation` if the account holds fewer shares than
    ///   requested. The caller must check solvency beforehand.
    ///
    /// The ledger is left untouched on error.
    pub fn burn_from_most_recent(
        &mut self,
        account: &AccountId,
        shares_to_burn: Shares,
        now: Timestamp,
        ctx: &RewardContext,
    ) -> Result<Redemption, GeyserError> {
        let redemption = plan_burn(self.stakes_of(account), shares_to_burn, now, ctx)?;

        let entries = self.stakes.get_mut(account).ok_or_else(|| {
            GeyserError::InvariantViolation(format!("no stake history for {}", account))
        })?;
        for chunk in &redemption.chunks {
            let last = entries.len() - 1;
            if chunk.shares == entries[last].shares {
                entries.pop();
            } else {
                entries[last].shares -= chunk.shares;
            }
        }
        if entries.is_empty() {
            self.stakes.remove(account);
        }

        tracing::debug!(
            "Burned {} shares ({} share-seconds) from {} across {} entries, reward {}",
            redemption.shares_burned,
            redemption.share_seconds_burned,
            account,
            redemption.chunks.len(),
            redemption.reward
        );
        Ok(redemption)
    }
}

fn plan_burn(
    entries: &[StakeEntry],
    shares_to_burn: Shares,
    now: Timestamp,
    ctx: &RewardContext,
) -> Result<Redemption, GeyserError> {
    if shares_to_burn == 0 {
        return Err(GeyserError::InvalidInput(
            "cannot burn zero shares".to_string(),
        ));
    }
    let held: Shares = entries.iter().map(|e| e.shares).sum();
    if shares_to_burn > held {
        return Err(GeyserError::InvariantViolation(format!(
            "burning {} shares from an account holding {}",
            shares_to_burn, held
        )));
    }

    let mut redemption = Redemption::default();
    let mut remaining = shares_to_burn;

    for entry in entries.iter().rev() {
        if remaining == 0 {
            break;
        }
        let held_sec = now.checked_sub(entry.timestamp).ok_or_else(|| {
            GeyserError::InvalidInput(format!(
                "stake at {} is later than redemption time {}",
                entry.timestamp, now
            ))
        })?;

        let shares = entry.shares.min(remaining);
        let share_seconds = checked_mul(shares, u128::from(held_sec), "chunk share-seconds")?;
        let before = redemption.reward;
        redemption.reward = ctx.compute_new_reward(before, share_seconds, held_sec)?;

        redemption.chunks.push(RedeemedChunk {
            shares,
            share_seconds,
            held_sec,
            reward: redemption.reward - before,
        });
        redemption.share_seconds_burned = checked_add(
            redemption.share_seconds_burned,
            share_seconds,
            "burned share-seconds",
        )?;
        redemption.shares_burned += shares;
        remaining -= shares;
    }

    Ok(redemption)
}
