// crates/geyser-economics/tests/engine_scenarios.rs
//
// End-to-end scenarios for the accounting engine, driven through the
// in-memory token banks, escrows and treasury.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geyser_core::{
    AccountId, Amount, ErrorKind, EventKind, FeePolicy, GeyserError, TokenEscrow,
};
use geyser_economics::{
    AccountingEngine, BankEscrow, EvenUnitFee, NoFee, PoolParams, PrincipalTreasury, StakeEntry,
    TokenBank,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const STAKING_VAULT: &str = "vault:staking";
const REWARD_VAULT: &str = "vault:rewards";
const TREASURY: &str = "treasury";

struct Pool {
    engine: AccountingEngine,
    stk: TokenBank,
    rwd: TokenBank,
}

fn id(name: &str) -> AccountId {
    AccountId::new(name)
}

/// 50% start bonus reaching 100% after 100s, 10s lockup, 1 share per token.
fn simple_params() -> PoolParams {
    PoolParams {
        start_bonus_bp: 5_000,
        bonus_period_sec: 100,
        initial_shares_per_token: 1,
        lockup_sec: 10,
        max_stakes_per_account: 64,
    }
}

fn pool_with(params: PoolParams, fee: Box<dyn FeePolicy>) -> Pool {
    let stk = TokenBank::new("STK");
    let rwd = TokenBank::new("RWD");
    let engine = AccountingEngine::new(
        params,
        fee,
        Box::new(BankEscrow::new(stk.clone(), STAKING_VAULT)),
        Box::new(BankEscrow::new(rwd.clone(), REWARD_VAULT)),
        Box::new(PrincipalTreasury::new(rwd.clone(), TREASURY)),
        0,
    )
    .unwrap();
    Pool { engine, stk, rwd }
}

fn simple_pool() -> Pool {
    pool_with(simple_params(), Box::new(NoFee))
}

impl Pool {
    fn fund_stakers(&self, names: &[&str], amount: Amount) {
        for name in names {
            self.stk.mint(&id(name), amount).unwrap();
        }
    }

    /// Yield that the treasury may release on the next call.
    fn add_yield(&self, amount: Amount) {
        self.rwd.mint(&id(TREASURY), amount).unwrap();
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.engine.events().iter().map(|e| e.kind).collect()
    }
}

/// Escrow whose pay-outs can be switched off to simulate a failed transfer.
struct FlakyEscrow {
    inner: BankEscrow,
    fail_pay_out: Arc<AtomicBool>,
}

impl TokenEscrow for FlakyEscrow {
    fn account(&self) -> &AccountId {
        self.inner.account()
    }

    fn deposit_from(&mut self, payer: &AccountId, amount: Amount) -> Result<(), GeyserError> {
        self.inner.deposit_from(payer, amount)
    }

    fn pay_out(&mut self, recipient: &AccountId, amount: Amount) -> Result<(), GeyserError> {
        if self.fail_pay_out.load(Ordering::SeqCst) {
            return Err(GeyserError::Collaborator("transfer rejected".to_string()));
        }
        self.inner.pay_out(recipient, amount)
    }

    fn balance(&self) -> Amount {
        self.inner.balance()
    }
}

// ---------------------------------------------------------------------------
// Share minting
// ---------------------------------------------------------------------------

#[test]
fn test_first_staker_sets_share_price() {
    let params = PoolParams {
        initial_shares_per_token: 1_000,
        ..simple_params()
    };
    let mut pool = pool_with(params, Box::new(EvenUnitFee));
    pool.fund_stakers(&["alice"], 1_000);

    let receipt = pool.engine.stake(&id("alice"), 1_000, "", 1).unwrap();

    assert_eq!(receipt.net, 990);
    assert_eq!(receipt.minted_shares, 990_000);
    assert_eq!(pool.engine.global_totals().shares, 990_000);
    // The gross deposit is escrowed; the fee stays inside the pool.
    assert_eq!(pool.engine.total_staked(), 1_000);
    assert_eq!(pool.engine.total_staked_for(&id("alice")), 1_000);
    assert_eq!(pool.stk.balance_of(&id("alice")), 0);
}

#[test]
fn test_fee_accrues_to_existing_holders() {
    let params = PoolParams {
        initial_shares_per_token: 1_000,
        ..simple_params()
    };
    let mut pool = pool_with(params, Box::new(EvenUnitFee));
    pool.fund_stakers(&["alice", "bob"], 1_000);

    pool.engine.stake(&id("alice"), 1_000, "", 1).unwrap();
    let bob = pool.engine.stake(&id("bob"), 1_000, "", 2).unwrap();

    // Minted against the pool before bob's tokens are counted.
    assert_eq!(bob.minted_shares, 990_000 * 990 / 1_000);
    let alice_value = pool.engine.total_staked_for(&id("alice"));
    let bob_value = pool.engine.total_staked_for(&id("bob"));
    assert!(alice_value > 1_000, "alice should gain from bob's fee: {}", alice_value);
    assert!(bob_value < 1_000, "bob pays the fee: {}", bob_value);
    assert!(alice_value + bob_value <= 2_000);
    assert!(2_000 - (alice_value + bob_value) <= 2);
}

#[test]
fn test_zero_stake_rejected() {
    let mut pool = simple_pool();
    let err = pool.engine.stake(&id("alice"), 0, "", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_dust_stake_rejected() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice", "bob"], 1_000);
    pool.stk.mint(&id("donor"), 1_000_000).unwrap();

    pool.engine.stake(&id("alice"), 1, "", 1).unwrap();
    // Inflate the share price: 1 share now backs 1_000_001 tokens.
    pool.stk
        .transfer(&id("donor"), &id(STAKING_VAULT), 1_000_000)
        .unwrap();

    let err = pool.engine.stake(&id("bob"), 1_000, "", 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DustAmount);
    assert_eq!(pool.stk.balance_of(&id("bob")), 1_000);
    assert!(pool.engine.account_totals(&id("bob")).is_none());
}

#[test]
fn test_stake_into_unbacked_shares_rejected() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice", "bob"], 100);
    pool.engine.stake(&id("alice"), 100, "", 1).unwrap();

    // Drain the escrow behind the engine's back.
    pool.stk
        .transfer(&id(STAKING_VAULT), &id("thief"), 100)
        .unwrap();

    let err = pool.engine.stake(&id("bob"), 100, "", 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

// ---------------------------------------------------------------------------
// Redemption order and lockup
// ---------------------------------------------------------------------------

#[test]
fn test_unstake_redeems_most_recent_stake_first() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 150);

    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();
    pool.engine.stake(&id("alice"), 50, "", 10).unwrap();

    let receipt = pool.engine.unstake(&id("alice"), 50, "", 30).unwrap();

    assert_eq!(receipt.shares_burned, 50);
    assert_eq!(receipt.share_seconds_burned, 50 * 20);
    assert_eq!(
        pool.engine.stakes_of(&id("alice")),
        &[StakeEntry { shares: 100, timestamp: 0 }]
    );
}

#[test]
fn test_lockup_gates_on_most_recent_stake() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 200);

    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();
    assert!(!pool.engine.is_unlocked(&id("alice"), 10));
    assert!(pool.engine.is_unlocked(&id("alice"), 11));

    // Exactly at the lockup boundary: still locked.
    let err = pool.engine.unstake(&id("alice"), 10, "", 10).unwrap_err();
    assert!(matches!(err, GeyserError::LockupActive { unlocks_after: 10 }));

    // A fresh stake re-locks everything, even the old entry.
    pool.engine.stake(&id("alice"), 100, "", 100).unwrap();
    let err = pool.engine.unstake(&id("alice"), 10, "", 105).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockupActive);
    assert!(!pool.engine.is_unlocked(&id("alice"), 105));

    assert!(pool.engine.unstake(&id("alice"), 10, "", 111).is_ok());
}

#[test]
fn test_account_without_stake_is_not_unlocked() {
    let pool = simple_pool();
    assert!(!pool.engine.is_unlocked(&id("nobody"), 1_000));
}

#[test]
fn test_unstake_more_than_stake_rejected() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 100);
    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();

    let err = pool.engine.unstake(&id("alice"), 101, "", 50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = pool.engine.unstake(&id("alice"), 0, "", 50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = pool.engine.unstake(&id("bob"), 1, "", 50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_dust_unstake_rejected() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 1);
    pool.stk.mint(&id("donor"), 1_000).unwrap();
    pool.engine.stake(&id("alice"), 1, "", 0).unwrap();
    pool.stk
        .transfer(&id("donor"), &id(STAKING_VAULT), 1_000)
        .unwrap();

    // One token of 1_001 is worth less than one share.
    let err = pool.engine.unstake(&id("alice"), 1, "", 50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DustAmount);

    // The whole position still withdraws.
    let receipt = pool.engine.unstake_max(&id("alice"), "", 50).unwrap();
    assert_eq!(receipt.amount, 1_001);
    assert_eq!(pool.engine.global_totals().shares, 0);
    assert_eq!(pool.engine.total_staked(), 0);
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

#[test]
fn test_single_staker_collects_full_pool_after_bonus_period() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 100);
    pool.add_yield(1_000);

    pool.engine.stake(&id("alice"), 100, "first", 0).unwrap();
    assert_eq!(pool.engine.total_unlocked(), 1_000);

    let receipt = pool.engine.unstake_max(&id("alice"), "exit", 200).unwrap();
    assert_eq!(receipt.amount, 100);
    assert_eq!(receipt.reward, 1_000);
    assert_eq!(pool.stk.balance_of(&id("alice")), 100);
    assert_eq!(pool.rwd.balance_of(&id("alice")), 1_000);
    assert_eq!(pool.engine.total_unlocked(), 0);

    assert_eq!(
        pool.kinds(),
        vec![
            EventKind::FundsUnlocked,
            EventKind::Staked,
            EventKind::Unstaked,
            EventKind::RewardClaimed
        ]
    );
    let claimed = pool.engine.events().last().unwrap();
    assert_eq!(claimed.amount, 1_000);
    assert_eq!(claimed.total, 0);
    assert_eq!(claimed.data, "exit");
}

#[test]
fn test_rewards_split_by_share_seconds() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice", "bob"], 100);
    pool.add_yield(1_000);

    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();
    pool.engine.stake(&id("bob"), 100, "", 100).unwrap();

    // Global: 100 * 100 + 200 * 200 = 50_000; alice: 100 * 300 = 30_000.
    let alice = pool.engine.unstake_max(&id("alice"), "", 300).unwrap();
    assert_eq!(alice.reward, 600);
    assert_eq!(pool.engine.global_totals().share_seconds, 20_000);

    // Bob now owns every remaining share-second.
    let bob = pool.engine.unstake_max(&id("bob"), "", 400).unwrap();
    assert_eq!(bob.reward, 400);
    assert_eq!(pool.engine.global_totals().share_seconds, 0);
    assert_eq!(pool.engine.global_totals().shares, 0);
}

#[test]
fn test_early_exit_forfeits_part_of_reward() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 100);
    pool.add_yield(1_000);
    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();

    // Held 50 of 100 bonus seconds: 50% + 50% * 0.5 = 75%.
    let receipt = pool.engine.unstake_max(&id("alice"), "", 50).unwrap();
    assert_eq!(receipt.reward, 750);
    assert_eq!(pool.engine.total_unlocked(), 250);
}

#[test]
fn test_unstake_query_matches_unstake() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 150);
    pool.add_yield(1_000);
    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();
    pool.engine.stake(&id("alice"), 50, "", 20).unwrap();

    // Yield that arrives later is pending until the next call releases it.
    pool.add_yield(500);
    assert_eq!(pool.engine.total_pending(), 500);

    let quoted = pool.engine.unstake_query(&id("alice"), 120, 60).unwrap();
    assert_eq!(pool.engine.total_unlocked(), 1_000);
    let receipt = pool.engine.unstake(&id("alice"), 120, "", 60).unwrap();
    assert_eq!(quoted, receipt.reward);
    assert!(receipt.reward > 0);
}

#[test]
fn test_unstake_query_applies_lockup() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 100);
    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();
    let err = pool.engine.unstake_query(&id("alice"), 100, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockupActive);
}

#[test]
fn test_locked_principal_only_yield_is_released() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 100);
    pool.rwd.mint(&id("funder"), 10_000).unwrap();

    let principal = pool
        .engine
        .lock_funds(&id("funder"), 10_000, "season 1", 0)
        .unwrap();
    assert_eq!(principal, 10_000);
    assert_eq!(pool.engine.total_principal(), 10_000);
    assert_eq!(pool.engine.total_pending(), 0);

    pool.add_yield(300);
    assert_eq!(pool.engine.total_pending(), 300);

    pool.engine.stake(&id("alice"), 100, "", 1).unwrap();
    assert_eq!(pool.engine.total_unlocked(), 300);
    assert_eq!(pool.engine.total_pending(), 0);
    assert_eq!(pool.rwd.balance_of(&id(TREASURY)), 10_000);

    let events = pool.engine.events();
    assert_eq!(events[0].kind, EventKind::FundsLocked);
    assert_eq!(events[0].total, 10_000);
    assert_eq!(events[0].data, "season 1");
    assert_eq!(events[1].kind, EventKind::FundsUnlocked);
    assert_eq!(events[1].actor, id(TREASURY));
    assert_eq!(events[1].amount, 300);
}

#[test]
fn test_update_accounting_accrues_monotonically() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["alice"], 100);
    pool.engine.stake(&id("alice"), 100, "", 0).unwrap();

    let mut last = 0;
    for now in [1u64, 2, 10, 11, 500] {
        let snap = pool.engine.update_accounting(&id("alice"), now).unwrap();
        assert!(snap.account_share_seconds > last);
        assert_eq!(snap.account_share_seconds, 100 * u128::from(now));
        last = snap.account_share_seconds;
    }
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[test]
fn test_failed_stake_pay_out_rolls_back() {
    let stk = TokenBank::new("STK");
    let rwd = TokenBank::new("RWD");
    let fail = Arc::new(AtomicBool::new(false));
    let mut engine = AccountingEngine::new(
        simple_params(),
        Box::new(NoFee),
        Box::new(FlakyEscrow {
            inner: BankEscrow::new(stk.clone(), STAKING_VAULT),
            fail_pay_out: fail.clone(),
        }),
        Box::new(BankEscrow::new(rwd.clone(), REWARD_VAULT)),
        Box::new(PrincipalTreasury::new(rwd.clone(), TREASURY)),
        0,
    )
    .unwrap();
    stk.mint(&id("alice"), 100).unwrap();
    engine.stake(&id("alice"), 100, "", 0).unwrap();
    let before = engine.global_totals();
    let stakes_before = engine.stakes_of(&id("alice")).to_vec();
    let events_before = engine.events().len();

    fail.store(true, Ordering::SeqCst);
    let err = engine.unstake(&id("alice"), 40, "", 50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Collaborator);

    assert_eq!(engine.global_totals(), before);
    assert_eq!(engine.stakes_of(&id("alice")), stakes_before.as_slice());
    assert_eq!(engine.events().len(), events_before);
    assert_eq!(engine.total_staked_for(&id("alice")), 100);

    fail.store(false, Ordering::SeqCst);
    assert!(engine.unstake(&id("alice"), 40, "", 50).is_ok());
}

#[test]
fn test_failed_reward_pay_out_reclaims_stake() {
    let stk = TokenBank::new("STK");
    let rwd = TokenBank::new("RWD");
    let fail = Arc::new(AtomicBool::new(false));
    let mut engine = AccountingEngine::new(
        simple_params(),
        Box::new(NoFee),
        Box::new(BankEscrow::new(stk.clone(), STAKING_VAULT)),
        Box::new(FlakyEscrow {
            inner: BankEscrow::new(rwd.clone(), REWARD_VAULT),
            fail_pay_out: fail.clone(),
        }),
        Box::new(PrincipalTreasury::new(rwd.clone(), TREASURY)),
        0,
    )
    .unwrap();
    stk.mint(&id("alice"), 100).unwrap();
    rwd.mint(&id(TREASURY), 1_000).unwrap();
    engine.stake(&id("alice"), 100, "", 0).unwrap();
    let account_before = engine.account_totals(&id("alice")).unwrap();

    fail.store(true, Ordering::SeqCst);
    let err = engine.unstake_max(&id("alice"), "", 200).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Collaborator);

    // Stake went back into escrow and the books are as they were.
    assert_eq!(stk.balance_of(&id("alice")), 0);
    assert_eq!(engine.total_staked(), 100);
    assert_eq!(engine.account_totals(&id("alice")), Some(account_before));
    assert_eq!(rwd.balance_of(&id("alice")), 0);
    assert_eq!(engine.total_unlocked(), 1_000);
}

#[test]
fn test_summary_serializes_accounts_in_order() {
    let mut pool = simple_pool();
    pool.fund_stakers(&["carol", "alice"], 100);
    pool.engine.stake(&id("carol"), 60, "", 1).unwrap();
    pool.engine.stake(&id("alice"), 40, "", 2).unwrap();

    let json = serde_json::to_value(pool.engine.summary()).unwrap();
    assert_eq!(json["fee_policy"], "none");
    assert_eq!(json["total_staked"], 100);
    assert_eq!(json["accounts"][0]["account"], "alice");
    assert_eq!(json["accounts"][0]["staked"], 40);
    assert_eq!(json["accounts"][1]["account"], "carol");
    assert_eq!(json["accounts"][1]["open_stakes"], 1);
}
