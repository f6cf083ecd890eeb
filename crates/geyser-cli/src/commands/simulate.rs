// crates/geyser-cli/src/commands/simulate.rs
//
// `geyser simulate --scenario FILE`: replay a scenario through a fresh pool.
//
// The pool runs on in-memory token banks behind a SharedEngine. Each step's
// outcome is recorded; a failed step is reported with its error kind and
// the replay moves on to the next one.

use std::collections::BTreeMap;

use clap::Args;
use geyser_core::{AccountId, Amount, ErrorKind, GeyserError, GeyserEvent, Timestamp};
use geyser_economics::{
    format_amount, AccountingEngine, BankEscrow, PoolConfig, PoolSummary, PrincipalTreasury,
    SharedEngine, TokenBank,
};
use serde::Serialize;
use tabled::Tabled;

use crate::config::CliConfig;
use crate::output::{section, OutputFormat};
use crate::scenario::{Action, Asset, Scenario, Step};

const STAKING_VAULT: &str = "vault:staking";
const REWARD_VAULT: &str = "vault:rewards";
const TREASURY: &str = "treasury";
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Args)]
pub struct SimulateCmd {
    /// Path to the scenario TOML file.
    #[arg(long)]
    pub scenario: String,
}

/// What happened to one scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub at: Timestamp,
    pub action: Action,
    pub account: Option<String>,
    /// `None` when the step succeeded.
    pub error: Option<ErrorKind>,
    pub detail: String,
}

/// Wallet balances outside the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub staking_tokens: Amount,
    pub reward_tokens: Amount,
}

/// Units of one asset in existence at the end of the replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct AssetSupply {
    #[tabled(rename = "Asset")]
    pub symbol: String,
    #[tabled(rename = "Supply")]
    pub total_supply: Amount,
}

impl AssetSupply {
    fn of(bank: &TokenBank) -> Self {
        Self {
            symbol: bank.symbol().to_string(),
            total_supply: bank.total_supply(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepOutcome>,
    pub events: Vec<GeyserEvent>,
    pub summary: PoolSummary,
    pub balances: BTreeMap<AccountId, Balances>,
    pub supply: Vec<AssetSupply>,
}

impl SimulationReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.error.is_some()).count()
    }
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "At")]
    at: Timestamp,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Result")]
    result: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Share-seconds")]
    share_seconds: String,
    #[tabled(rename = "Staked")]
    staked: String,
    #[tabled(rename = "Open stakes")]
    open_stakes: usize,
    #[tabled(rename = "Wallet STK")]
    wallet_stk: String,
    #[tabled(rename = "Wallet RWD")]
    wallet_rwd: String,
}

/// Run the simulate subcommand.
pub async fn run(
    cmd: &SimulateCmd,
    config: &CliConfig,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&cmd.scenario)?;
    tracing::info!(
        "Replaying {} with {} mints and {} steps",
        cmd.scenario,
        scenario.mint.len(),
        scenario.step.len()
    );
    let report = replay(&config.pool, &scenario, config.decimals).await?;
    format.emit(&report, |report| layout(report, config.decimals))?;
    Ok(())
}

/// Build a pool from `pool` and replay every step of `scenario`.
///
/// Only setup failures (bad parameters, bad mints) are returned as errors;
/// step failures are recorded in the report.
pub async fn replay(
    pool: &PoolConfig,
    scenario: &Scenario,
    decimals: u32,
) -> Result<SimulationReport, GeyserError> {
    let stk = TokenBank::new("STK");
    let rwd = TokenBank::new("RWD");
    let engine = AccountingEngine::new(
        pool.params()?,
        pool.fee_policy()?,
        Box::new(BankEscrow::new(stk.clone(), STAKING_VAULT)),
        Box::new(BankEscrow::new(rwd.clone(), REWARD_VAULT)),
        Box::new(PrincipalTreasury::new(rwd.clone(), TREASURY)),
        scenario.start,
    )?;
    let shared = SharedEngine::new(engine, EVENT_BUFFER);
    let mut receiver = shared.subscribe();

    for mint in &scenario.mint {
        let bank = match mint.asset {
            Asset::Stake => &stk,
            Asset::Reward => &rwd,
        };
        bank.mint(&AccountId::new(mint.account.as_str()), u128::from(mint.amount))?;
    }

    let mut steps = Vec::with_capacity(scenario.step.len());
    let mut events = Vec::new();
    for (i, step) in scenario.step.iter().enumerate() {
        let index = i + 1;
        let (error, detail) = match apply(&shared, &rwd, step, decimals).await {
            Ok(detail) => (None, detail),
            Err(e) => {
                tracing::warn!("Step {} ({} at {}) failed: {}", index, step.action, step.at, e);
                (Some(e.kind()), e.to_string())
            }
        };
        steps.push(StepOutcome {
            index,
            at: step.at,
            action: step.action,
            account: step.account.clone(),
            error,
            detail,
        });
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
    }

    let summary = shared.summary().await;
    let mut balances: BTreeMap<AccountId, Balances> = BTreeMap::new();
    for (account, amount) in stk.holders() {
        balances.entry(account).or_default().staking_tokens = amount;
    }
    for (account, amount) in rwd.holders() {
        balances.entry(account).or_default().reward_tokens = amount;
    }

    Ok(SimulationReport {
        steps,
        events,
        summary,
        balances,
        supply: vec![AssetSupply::of(&stk), AssetSupply::of(&rwd)],
    })
}

async fn apply(
    shared: &SharedEngine,
    rwd: &TokenBank,
    step: &Step,
    decimals: u32,
) -> Result<String, GeyserError> {
    let fmt = |amount: Amount| format_amount(amount, decimals);
    match step.action {
        Action::Stake => {
            let account = AccountId::new(step.account()?);
            let r = shared.stake(&account, step.amount()?, &step.data, step.at).await?;
            Ok(format!(
                "staked {} (net {}, fee {}) for {} shares",
                fmt(r.amount),
                fmt(r.net),
                fmt(r.fee),
                r.minted_shares
            ))
        }
        Action::Unstake | Action::UnstakeMax => {
            let account = AccountId::new(step.account()?);
            let r = if step.action == Action::Unstake {
                shared.unstake(&account, step.amount()?, &step.data, step.at).await?
            } else {
                shared.unstake_max(&account, &step.data, step.at).await?
            };
            Ok(format!(
                "withdrew {} and claimed {} reward ({} shares burned)",
                fmt(r.amount),
                fmt(r.reward),
                r.shares_burned
            ))
        }
        Action::Lock => {
            let funder = AccountId::new(step.account()?);
            let principal = shared
                .lock_funds(&funder, step.amount()?, &step.data, step.at)
                .await?;
            Ok(format!("treasury principal now {}", fmt(principal)))
        }
        Action::AccrueYield => {
            let amount = step.amount()?;
            rwd.mint(&AccountId::new(TREASURY), amount)?;
            Ok(format!("treasury earned {}", fmt(amount)))
        }
        Action::Accounting => {
            let account = AccountId::new(step.account()?);
            let snap = shared.update_accounting(&account, step.at).await?;
            Ok(format!(
                "{} of {} share-seconds, projected reward {} of {}",
                snap.account_share_seconds,
                snap.total_share_seconds,
                fmt(snap.projected_reward),
                fmt(snap.total_unlocked)
            ))
        }
    }
}

fn layout(report: &SimulationReport, decimals: u32) -> String {
    let fmt = |amount: Amount| format_amount(amount, decimals);

    let step_rows: Vec<StepRow> = report
        .steps
        .iter()
        .map(|s| StepRow {
            index: s.index,
            at: s.at,
            action: s.action.to_string(),
            account: s.account.clone().unwrap_or_else(|| "-".to_string()),
            result: match s.error {
                Some(kind) => format!("FAILED [{}] {}", kind, s.detail),
                None => s.detail.clone(),
            },
        })
        .collect();

    let mut events = String::from("Events");
    if report.events.is_empty() {
        events.push_str("\n  (none)");
    }
    for event in &report.events {
        events.push_str(&format!("\n  {}", event));
    }

    let account_rows: Vec<AccountRow> = report
        .summary
        .accounts
        .iter()
        .map(|a| {
            let wallet = report.balances.get(&a.account).cloned().unwrap_or_default();
            AccountRow {
                account: a.account.to_string(),
                shares: a.shares.to_string(),
                share_seconds: a.share_seconds.to_string(),
                staked: fmt(a.staked),
                open_stakes: a.open_stakes,
                wallet_stk: fmt(wallet.staking_tokens),
                wallet_rwd: fmt(wallet.reward_tokens),
            }
        })
        .collect();

    let s = &report.summary;
    let pool = format!(
        "Pool: staked {}, shares {}, reward pool {}, pending {}, principal {}, fee policy {}",
        fmt(s.total_staked),
        s.totals.shares,
        fmt(s.total_unlocked),
        fmt(s.total_pending),
        fmt(s.total_principal),
        s.fee_policy
    );

    [
        section("Steps", &step_rows),
        events,
        section("Accounts", &account_rows),
        section("Supply", &report.supply),
        pool,
        format!("{} steps, {} failed", report.steps.len(), report.failed_steps()),
    ]
    .join("\n\n")
}
