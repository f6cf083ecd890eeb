// crates/geyser-economics/src/engine.rs
//
// The accounting engine: time-weighted share accounting for the staking pool.
//
// Stakers deposit the staking token and receive staking shares. The first
// staker mints `initial_shares_per_token` shares per net token; later
// stakers mint in proportion to the pool they join:
//
//   minted = total_shares * net / total_staked
//
// The gross deposit lands in escrow while shares are minted on the net
// amount, so the withheld fee raises the value of every existing share.
//
// Every mutating call follows the same order:
//   1. validate the request against current state
//   2. release available treasury funds into the reward pool
//   3. advance global and caller share-seconds to `now`
//   4. mint or burn shares and update the stake ledger
//   5. move tokens through the escrows
//   6. record events
//
// Internal state touched in steps 3-4 is checkpointed and restored if a
// later step fails, so a call either commits in full or not at all.

use std::collections::HashMap;

use geyser_core::{
    AccountId, Amount, EventKind, FeePolicy, FundingSource, GeyserError, GeyserEvent,
    ShareSeconds, Shares, Timestamp, TokenEscrow,
};
use serde::{Deserialize, Serialize};

use crate::config::PoolParams;
use crate::math::{checked_add, checked_mul, checked_sub, mul_div};
use crate::rewards::{BonusCurve, RewardContext};
use crate::staking::{Redemption, StakeEntry, StakeLedger};

/// Pool-wide accounting counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTotals {
    /// Outstanding staking shares across all accounts.
    pub shares: Shares,
    /// Share-seconds accrued up to `last_accounting_timestamp`.
    pub share_seconds: ShareSeconds,
    pub last_accounting_timestamp: Timestamp,
}

/// Per-account accounting counters. Created on first stake, never deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub shares: Shares,
    pub share_seconds: ShareSeconds,
    pub last_accounting_timestamp: Timestamp,
}

/// Result of a successful stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeReceipt {
    /// Gross amount pulled into escrow.
    pub amount: Amount,
    /// Amount credited after the fee.
    pub net: Amount,
    /// Amount withheld by the fee policy.
    pub fee: Amount,
    pub minted_shares: Shares,
}

/// Result of a successful unstake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstakeReceipt {
    /// Staking tokens paid out.
    pub amount: Amount,
    pub shares_burned: Shares,
    pub share_seconds_burned: ShareSeconds,
    /// Reward tokens paid out.
    pub reward: Amount,
}

/// Accounting state after an explicit `update_accounting` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingSnapshot {
    /// Treasury principal (never released).
    pub total_locked: Amount,
    /// Reward pool balance.
    pub total_unlocked: Amount,
    pub account_share_seconds: ShareSeconds,
    pub total_share_seconds: ShareSeconds,
    /// Reward the account's share-seconds entitle it to at full bonus.
    pub projected_reward: Amount,
    pub now: Timestamp,
}

/// Per-account line of a [`PoolSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account: AccountId,
    pub shares: Shares,
    pub share_seconds: ShareSeconds,
    /// Stake value in staking tokens.
    pub staked: Amount,
    pub open_stakes: usize,
}

/// Serializable view of the whole pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub fee_policy: String,
    pub total_staked: Amount,
    pub totals: GlobalTotals,
    pub total_unlocked: Amount,
    pub total_pending: Amount,
    pub total_principal: Amount,
    /// Accounts sorted by id.
    pub accounts: Vec<AccountSummary>,
}

/// Saved state for rolling back a failed call.
struct Checkpoint {
    account: AccountId,
    totals: GlobalTotals,
    account_totals: Option<AccountTotals>,
    stakes: Vec<StakeEntry>,
    events_len: usize,
}

/// Time-weighted staking and reward accounting engine.
///
/// Owns all share and share-second state. Token custody, the funding
/// treasury, and the fee rule are injected collaborators.
pub struct AccountingEngine {
    params: PoolParams,
    curve: BonusCurve,
    fee: Box<dyn FeePolicy>,
    staking: Box<dyn TokenEscrow>,
    rewards: Box<dyn TokenEscrow>,
    treasury: Box<dyn FundingSource>,
    totals: GlobalTotals,
    accounts: HashMap<AccountId, AccountTotals>,
    ledger: StakeLedger,
    events: Vec<GeyserEvent>,
    entered: bool,
}

impl AccountingEngine {
    /// Create an engine whose accounting clock starts at `now`.
    ///
    /// # Errors
    /// Returns `GeyserError::InvalidInput` if `params` fail validation.
    pub fn new(
        params: PoolParams,
        fee: Box<dyn FeePolicy>,
        staking: Box<dyn TokenEscrow>,
        rewards: Box<dyn TokenEscrow>,
        treasury: Box<dyn FundingSource>,
        now: Timestamp,
    ) -> Result<Self, GeyserError> {
        params.validate()?;
        let curve = params.bonus_curve()?;
        tracing::info!(
            "Pool created: start bonus {} bp over {}s, lockup {}s, {} shares/token, fee {}",
            params.start_bonus_bp,
            params.bonus_period_sec,
            params.lockup_sec,
            params.initial_shares_per_token,
            fee.name()
        );
        Ok(Self {
            params,
            curve,
            fee,
            staking,
            rewards,
            treasury,
            totals: GlobalTotals {
                last_accounting_timestamp: now,
                ..GlobalTotals::default()
            },
            accounts: HashMap::new(),
            ledger: StakeLedger::new(),
            events: Vec::new(),
            entered: false,
        })
    }

    // -----------------------------------------------------------------------
    // Mutating entry points
    // -----------------------------------------------------------------------

    /// Deposit `amount` staking tokens from `account` and mint shares.
    ///
    /// # Errors
    /// - `InvalidInput`: zero amount, clock behind the last accounting time,
    ///   or the account already has `max_stakes_per_account` open stakes.
    /// - `InvariantViolation`: shares exist without backing tokens, or the
    ///   fee policy credited more than the deposit.
    /// - `DustAmount`: the net amount mints zero shares.
    /// - `Collaborator`: the escrow could not pull the deposit.
    pub fn stake(
        &mut self,
        account: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<StakeReceipt, GeyserError> {
        self.guarded(|engine| engine.stake_inner(account, amount, data, now))
    }

    /// Withdraw `amount` staking tokens for `account`, burning shares from
    /// the most recent stakes first and paying out the earned reward.
    ///
    /// # Errors
    /// - `InvalidInput`: zero amount or more than the account's stake value.
    /// - `DustAmount`: `amount` burns zero shares.
    /// - `LockupActive`: the most recent stake is not older than the lockup.
    /// - `InvariantViolation`: the withdrawal would leave shares unbacked.
    /// - `Collaborator`: an escrow pay-out or treasury release failed.
    pub fn unstake(
        &mut self,
        account: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, GeyserError> {
        self.guarded(|engine| engine.unstake_inner(account, amount, data, now))
    }

    /// Withdraw the account's entire stake value.
    pub fn unstake_max(
        &mut self,
        account: &AccountId,
        data: &str,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, GeyserError> {
        let amount = self.total_staked_for(account);
        self.unstake(account, amount, data, now)
    }

    /// Lock `amount` reward tokens from `funder` into the treasury principal.
    pub fn lock_funds(
        &mut self,
        funder: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<Amount, GeyserError> {
        self.guarded(|engine| {
            engine.check_clock(now)?;
            let principal = engine.treasury.lock(funder, amount)?;
            tracing::info!(
                "Locked {} into treasury from {}; principal now {}",
                amount,
                funder,
                principal
            );
            engine.emit(EventKind::FundsLocked, funder.clone(), amount, principal, data, now);
            Ok(principal)
        })
    }

    /// Release pending treasury funds and advance global and `account`
    /// share-seconds to `now`.
    pub fn update_accounting(
        &mut self,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<AccountingSnapshot, GeyserError> {
        self.guarded(|engine| {
            engine.check_clock(now)?;
            engine.release_pending(now)?;
            let checkpoint = engine.checkpoint(account);
            if let Err(e) = engine.accrue(account, now) {
                engine.restore(checkpoint);
                return Err(e);
            }
            engine.snapshot(account, now)
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Staking tokens held in escrow.
    pub fn total_staked(&self) -> Amount {
        self.staking.balance()
    }

    /// Stake value of `account` in staking tokens; zero if no shares exist.
    pub fn total_staked_for(&self, account: &AccountId) -> Amount {
        if self.totals.shares == 0 {
            return 0;
        }
        let shares = self.accounts.get(account).map_or(0, |a| a.shares);
        // Bounded by total_staked since shares <= total shares.
        mul_div(self.total_staked(), shares, self.totals.shares).unwrap_or(0)
    }

    /// Reward pool balance.
    pub fn total_unlocked(&self) -> Amount {
        self.rewards.balance()
    }

    /// Treasury funds waiting to be released into the reward pool.
    pub fn total_pending(&self) -> Amount {
        self.treasury.funds_available()
    }

    /// Treasury principal.
    pub fn total_principal(&self) -> Amount {
        self.treasury.principal()
    }

    /// Whether `account` could unstake at `now` as far as the lockup goes.
    pub fn is_unlocked(&self, account: &AccountId, now: Timestamp) -> bool {
        match self.ledger.most_recent(account) {
            Some(entry) => now.saturating_sub(entry.timestamp) > self.params.lockup_sec,
            None => false,
        }
    }

    /// Stake history of `account`, oldest first.
    pub fn stakes_of(&self, account: &AccountId) -> &[StakeEntry] {
        self.ledger.stakes_of(account)
    }

    /// Accounting counters of `account`, if it ever staked.
    pub fn account_totals(&self, account: &AccountId) -> Option<AccountTotals> {
        self.accounts.get(account).copied()
    }

    pub fn global_totals(&self) -> GlobalTotals {
        self.totals
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn fee_policy_name(&self) -> &'static str {
        self.fee.name()
    }

    /// Reward an unstake of `amount` would pay at `now`, without changing
    /// anything. Pending treasury funds and accrual up to `now` are counted.
    pub fn unstake_query(
        &self,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, GeyserError> {
        self.check_clock(now)?;
        let shares_to_burn = self.validate_unstake(account, amount, now)?;

        let elapsed = u128::from(now - self.totals.last_accounting_timestamp);
        let accrued = checked_mul(self.totals.shares, elapsed, "global share-seconds")?;
        let ctx = RewardContext {
            total_unlocked: checked_add(
                self.total_unlocked(),
                self.total_pending(),
                "projected reward pool",
            )?,
            total_share_seconds: checked_add(
                self.totals.share_seconds,
                accrued,
                "global share-seconds",
            )?,
            curve: self.curve,
        };
        let redemption = self.ledger.preview_burn(account, shares_to_burn, now, &ctx)?;
        Ok(redemption.reward)
    }

    /// Events recorded since the last drain, oldest first.
    pub fn events(&self) -> &[GeyserEvent] {
        &self.events
    }

    /// Take all recorded events.
    pub fn drain_events(&mut self) -> Vec<GeyserEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serializable view of the pool and every account.
    pub fn summary(&self) -> PoolSummary {
        let mut accounts: Vec<AccountSummary> = self
            .accounts
            .iter()
            .map(|(account, totals)| AccountSummary {
                account: account.clone(),
                shares: totals.shares,
                share_seconds: totals.share_seconds,
                staked: self.total_staked_for(account),
                open_stakes: self.ledger.open_stakes(account),
            })
            .collect();
        accounts.sort_by(|a, b| a.account.cmp(&b.account));

        PoolSummary {
            fee_policy: self.fee.name().to_string(),
            total_staked: self.total_staked(),
            totals: self.totals,
            total_unlocked: self.total_unlocked(),
            total_pending: self.total_pending(),
            total_principal: self.total_principal(),
            accounts,
        }
    }

    // -----------------------------------------------------------------------
    // Stake / unstake
    // -----------------------------------------------------------------------

    fn stake_inner(
        &mut self,
        account: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<StakeReceipt, GeyserError> {
        self.check_clock(now)?;
        if amount == 0 {
            return Err(self.reject(account, GeyserError::InvalidInput(
                "stake amount must be greater than zero".to_string(),
            )));
        }
        let staked = self.total_staked();
        if self.totals.shares != 0 && staked == 0 {
            return Err(self.reject(account, GeyserError::InvariantViolation(format!(
                "{} shares outstanding with nothing staked",
                self.totals.shares
            ))));
        }

        let net = self.fee.apply_fee(amount);
        if net > amount {
            return Err(self.reject(account, GeyserError::InvariantViolation(format!(
                "fee policy {} credited {} for a deposit of {}",
                self.fee.name(),
                net,
                amount
            ))));
        }

        let minted = if self.totals.shares > 0 {
            mul_div(self.totals.shares, net, staked)?
        } else {
            checked_mul(net, self.params.initial_shares_per_token, "minted shares")?
        };
        if minted == 0 {
            return Err(self.reject(account, GeyserError::DustAmount(format!(
                "stake of {} (net {}) mints no shares",
                amount, net
            ))));
        }
        if self.ledger.open_stakes(account) >= self.params.max_stakes_per_account {
            return Err(self.reject(account, GeyserError::InvalidInput(format!(
                "{} already has {} open stakes",
                account, self.params.max_stakes_per_account
            ))));
        }

        self.release_pending(now)?;
        let checkpoint = self.checkpoint(account);
        if let Err(e) = self.commit_stake(account, minted, amount, now) {
            self.restore(checkpoint);
            return Err(self.reject(account, e));
        }
        if let Err(e) = self.staking.deposit_from(account, amount) {
            self.restore(checkpoint);
            return Err(self.reject(account, e));
        }
        self.check_backing()?;

        let total = self.total_staked_for(account);
        tracing::info!(
            "{} staked {} (net {}, fee {}) for {} shares; stake value now {}",
            account,
            amount,
            net,
            amount - net,
            minted,
            total
        );
        self.emit(EventKind::Staked, account.clone(), net, total, data, now);

        Ok(StakeReceipt {
            amount,
            net,
            fee: amount - net,
            minted_shares: minted,
        })
    }

    fn commit_stake(
        &mut self,
        account: &AccountId,
        minted: Shares,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), GeyserError> {
        self.accrue(account, now)?;

        let total_shares = checked_add(self.totals.shares, minted, "total shares")?;
        let acct = self.accounts.entry(account.clone()).or_insert_with(|| AccountTotals {
            last_accounting_timestamp: now,
            ..AccountTotals::default()
        });
        acct.shares = checked_add(acct.shares, minted, "account shares")?;
        self.ledger.append(account, minted, now);
        self.totals.shares = total_shares;

        // The deposit must fit in escrow before it is pulled.
        checked_add(self.total_staked(), amount, "total staked")?;
        Ok(())
    }

    fn unstake_inner(
        &mut self,
        account: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, GeyserError> {
        self.check_clock(now)?;
        let shares_to_burn = match self.validate_unstake(account, amount, now) {
            Ok(shares) => shares,
            Err(e) => return Err(self.reject(account, e)),
        };

        self.release_pending(now)?;
        let checkpoint = self.checkpoint(account);
        let redemption = match self.commit_unstake(account, shares_to_burn, amount, now) {
            Ok(r) => r,
            Err(e) => {
                self.restore(checkpoint);
                return Err(self.reject(account, e));
            }
        };

        if let Err(e) = self.staking.pay_out(account, amount) {
            self.restore(checkpoint);
            return Err(self.reject(account, e));
        }
        if redemption.reward > 0 {
            if let Err(e) = self.rewards.pay_out(account, redemption.reward) {
                return Err(self.reclaim_after_failed_reward(account, amount, checkpoint, e));
            }
        }
        self.check_backing()?;

        let total = self.total_staked_for(account);
        tracing::info!(
            "{} unstaked {} ({} shares, {} share-seconds) and claimed {}; stake value now {}",
            account,
            amount,
            redemption.shares_burned,
            redemption.share_seconds_burned,
            redemption.reward,
            total
        );
        self.emit(EventKind::Unstaked, account.clone(), amount, total, data, now);
        self.emit(
            EventKind::RewardClaimed,
            account.clone(),
            redemption.reward,
            total,
            data,
            now,
        );

        Ok(UnstakeReceipt {
            amount,
            shares_burned: redemption.shares_burned,
            share_seconds_burned: redemption.share_seconds_burned,
            reward: redemption.reward,
        })
    }

    /// Checks shared by `unstake` and `unstake_query`. Returns the shares
    /// `amount` burns.
    fn validate_unstake(
        &self,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Shares, GeyserError> {
        if amount == 0 {
            return Err(GeyserError::InvalidInput(
                "unstake amount must be greater than zero".to_string(),
            ));
        }
        let staked_for = self.total_staked_for(account);
        if amount > staked_for {
            return Err(GeyserError::InvalidInput(format!(
                "unstake of {} exceeds stake value {}",
                amount, staked_for
            )));
        }

        let staked = self.total_staked();
        let shares_to_burn = mul_div(self.totals.shares, amount, staked)?;
        if shares_to_burn == 0 {
            return Err(GeyserError::DustAmount(format!(
                "unstake of {} burns no shares",
                amount
            )));
        }

        let most_recent = self.ledger.most_recent(account).ok_or_else(|| {
            GeyserError::InvariantViolation(format!("{} holds shares but no stakes", account))
        })?;
        let unlocks_after = most_recent.timestamp.saturating_add(self.params.lockup_sec);
        if now <= unlocks_after {
            return Err(GeyserError::LockupActive { unlocks_after });
        }

        // Shares would remain with no tokens behind them.
        if staked - amount == 0 && self.totals.shares > shares_to_burn {
            return Err(GeyserError::InvariantViolation(format!(
                "withdrawing the last {} tokens would strand {} shares",
                amount,
                self.totals.shares - shares_to_burn
            )));
        }
        Ok(shares_to_burn)
    }

    fn commit_unstake(
        &mut self,
        account: &AccountId,
        shares_to_burn: Shares,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Redemption, GeyserError> {
        self.accrue(account, now)?;

        let ctx = RewardContext {
            total_unlocked: self.total_unlocked(),
            total_share_seconds: self.totals.share_seconds,
            curve: self.curve,
        };
        let redemption = self
            .ledger
            .burn_from_most_recent(account, shares_to_burn, now, &ctx)?;

        let acct = self.accounts.get_mut(account).ok_or_else(|| {
            GeyserError::InvariantViolation(format!("no accounting entry for {}", account))
        })?;
        acct.shares = checked_sub(acct.shares, redemption.shares_burned, "account shares")?;
        acct.share_seconds = checked_sub(
            acct.share_seconds,
            redemption.share_seconds_burned,
            "account share-seconds",
        )?;
        self.totals.shares =
            checked_sub(self.totals.shares, redemption.shares_burned, "total shares")?;
        self.totals.share_seconds = checked_sub(
            self.totals.share_seconds,
            redemption.share_seconds_burned,
            "total share-seconds",
        )?;

        if redemption.reward > self.total_unlocked() {
            return Err(GeyserError::InvariantViolation(format!(
                "reward {} exceeds reward pool {} for a withdrawal of {}",
                redemption.reward,
                self.total_unlocked(),
                amount
            )));
        }
        Ok(redemption)
    }

    /// The stake was paid out but the reward was not. Pull the stake back
    /// and roll back; if that also fails the burn stays committed, matching
    /// what the escrows now hold.
    fn reclaim_after_failed_reward(
        &mut self,
        account: &AccountId,
        amount: Amount,
        checkpoint: Checkpoint,
        cause: GeyserError,
    ) -> GeyserError {
        match self.staking.deposit_from(account, amount) {
            Ok(()) => {
                self.restore(checkpoint);
                self.reject(account, cause)
            }
            Err(reclaim) => {
                tracing::error!(
                    "Reward pay-out to {} failed ({}) and {} staked tokens could not be reclaimed ({}); burn committed without reward",
                    account,
                    cause,
                    amount,
                    reclaim
                );
                GeyserError::InvariantViolation(format!(
                    "reward pay-out failed ({}) after stake pay-out; reclaim failed ({})",
                    cause, reclaim
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accounting
    // -----------------------------------------------------------------------

    /// Advance global and `account` share-seconds to `now`.
    fn accrue(&mut self, account: &AccountId, now: Timestamp) -> Result<(), GeyserError> {
        let elapsed = u128::from(now - self.totals.last_accounting_timestamp);
        let accrued = checked_mul(self.totals.shares, elapsed, "global share-seconds")?;
        self.totals.share_seconds =
            checked_add(self.totals.share_seconds, accrued, "global share-seconds")?;
        self.totals.last_accounting_timestamp = now;

        // Accounts that never staked have nothing to accrue and get no entry.
        let Some(acct) = self.accounts.get_mut(account) else {
            tracing::debug!(
                "Accounting at {}: global {} share-seconds, {} has no stake",
                now,
                self.totals.share_seconds,
                account
            );
            return Ok(());
        };
        let elapsed = u128::from(now.saturating_sub(acct.last_accounting_timestamp));
        let accrued = checked_mul(acct.shares, elapsed, "account share-seconds")?;
        acct.share_seconds = checked_add(acct.share_seconds, accrued, "account share-seconds")?;
        acct.last_accounting_timestamp = now;

        tracing::debug!(
            "Accounting at {}: global {} share-seconds, {} {} share-seconds",
            now,
            self.totals.share_seconds,
            account,
            acct.share_seconds
        );
        Ok(())
    }

    /// Move every available treasury unit into the reward pool.
    fn release_pending(&mut self, now: Timestamp) -> Result<Amount, GeyserError> {
        if self.treasury.funds_available() == 0 {
            return Ok(0);
        }
        let released = self.treasury.release(self.rewards.account())?;
        if released > 0 {
            let total_unlocked = self.total_unlocked();
            tracing::info!(
                "Released {} from treasury; reward pool now {}",
                released,
                total_unlocked
            );
            let treasury = self.treasury.account().clone();
            self.emit(EventKind::FundsUnlocked, treasury, released, total_unlocked, "", now);
        }
        Ok(released)
    }

    fn snapshot(&self, account: &AccountId, now: Timestamp) -> Result<AccountingSnapshot, GeyserError> {
        let account_share_seconds = self.accounts.get(account).map_or(0, |a| a.share_seconds);
        let total_unlocked = self.total_unlocked();
        let projected_reward = if self.totals.share_seconds > 0 {
            mul_div(total_unlocked, account_share_seconds, self.totals.share_seconds)?
        } else {
            0
        };
        Ok(AccountingSnapshot {
            total_locked: self.total_principal(),
            total_unlocked,
            account_share_seconds,
            total_share_seconds: self.totals.share_seconds,
            projected_reward,
            now,
        })
    }

    // -----------------------------------------------------------------------
    // Guards, checkpoints, events
    // -----------------------------------------------------------------------

    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, GeyserError>,
    ) -> Result<T, GeyserError> {
        if self.entered {
            return Err(GeyserError::Reentrant);
        }
        self.entered = true;
        let result = op(self);
        self.entered = false;
        result
    }

    fn check_clock(&self, now: Timestamp) -> Result<(), GeyserError> {
        if now < self.totals.last_accounting_timestamp {
            return Err(GeyserError::InvalidInput(format!(
                "time {} is before the last accounting time {}",
                now, self.totals.last_accounting_timestamp
            )));
        }
        Ok(())
    }

    /// Shares may only exist while tokens back them.
    fn check_backing(&self) -> Result<(), GeyserError> {
        if self.totals.shares != 0 && self.total_staked() == 0 {
            tracing::error!(
                "Invariant violated: {} shares outstanding with an empty staking escrow",
                self.totals.shares
            );
            return Err(GeyserError::InvariantViolation(format!(
                "{} shares outstanding with nothing staked",
                self.totals.shares
            )));
        }
        Ok(())
    }

    fn checkpoint(&self, account: &AccountId) -> Checkpoint {
        Checkpoint {
            account: account.clone(),
            totals: self.totals,
            account_totals: self.accounts.get(account).copied(),
            stakes: self.ledger.stakes_of(account).to_vec(),
            events_len: self.events.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.totals = checkpoint.totals;
        match checkpoint.account_totals {
            Some(totals) => {
                self.accounts.insert(checkpoint.account.clone(), totals);
            }
            None => {
                self.accounts.remove(&checkpoint.account);
            }
        }
        self.ledger.restore(&checkpoint.account, checkpoint.stakes);
        self.events.truncate(checkpoint.events_len);
    }

    fn reject(&self, account: &AccountId, error: GeyserError) -> GeyserError {
        tracing::warn!("Rejected request from {}: {}", account, error);
        error
    }

    fn emit(
        &mut self,
        kind: EventKind,
        actor: AccountId,
        amount: Amount,
        total: Amount,
        data: &str,
        now: Timestamp,
    ) {
        self.events
            .push(GeyserEvent::new(kind, actor, amount, total, data, now));
    }
}
