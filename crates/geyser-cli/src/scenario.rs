// crates/geyser-cli/src/scenario.rs
//
// Scenario files for `geyser simulate`.
//
// A scenario seeds token balances with `[[mint]]` entries and then lists
// timed `[[step]]` actions that are replayed in order:
//
//   start = 0
//
//   [[mint]]
//   asset = "stake"
//   account = "alice"
//   amount = 1000
//
//   [[step]]
//   at = 10
//   action = "stake"
//   account = "alice"
//   amount = 1000

use std::fmt;
use std::fs;

use geyser_core::{Amount, GeyserError, Timestamp};
use serde::{Deserialize, Serialize};

/// Which token bank a mint entry credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Stake,
    Reward,
}

/// Initial balance for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub asset: Asset,
    pub account: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Stake,
    Unstake,
    UnstakeMax,
    /// Lock reward tokens into the treasury principal.
    Lock,
    /// Yield arriving at the treasury; released on the next pool call.
    AccrueYield,
    /// Explicit accounting update for an account.
    Accounting,
}

impl Action {
    fn needs_account(&self) -> bool {
        !matches!(self, Action::AccrueYield)
    }

    fn needs_amount(&self) -> bool {
        matches!(
            self,
            Action::Stake | Action::Unstake | Action::Lock | Action::AccrueYield
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Stake => "stake",
            Action::Unstake => "unstake",
            Action::UnstakeMax => "unstake-max",
            Action::Lock => "lock",
            Action::AccrueYield => "accrue-yield",
            Action::Accounting => "accounting",
        };
        write!(f, "{}", name)
    }
}

/// One timed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub at: Timestamp,
    pub action: Action,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
    /// Annotation carried on the step's events.
    #[serde(default)]
    pub data: String,
}

impl Step {
    /// The acting account, required by every action except `accrue-yield`.
    pub fn account(&self) -> Result<&str, GeyserError> {
        self.account.as_deref().ok_or_else(|| {
            GeyserError::Config(format!("{} step at {} needs an `account`", self.action, self.at))
        })
    }

    pub fn amount(&self) -> Result<Amount, GeyserError> {
        self.amount.map(u128::from).ok_or_else(|| {
            GeyserError::Config(format!("{} step at {} needs an `amount`", self.action, self.at))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Engine clock at creation.
    #[serde(default)]
    pub start: Timestamp,
    #[serde(default)]
    pub mint: Vec<Mint>,
    #[serde(default)]
    pub step: Vec<Step>,
}

impl Scenario {
    /// Load and check a scenario file.
    pub fn load(path: &str) -> Result<Self, GeyserError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| GeyserError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::parse(&contents)
    }

    pub fn parse(text: &str) -> Result<Self, GeyserError> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.check()?;
        Ok(scenario)
    }

    /// Every step carries the fields its action needs. Step order in time is
    /// left to the engine, which rejects a clock that runs backwards.
    fn check(&self) -> Result<(), GeyserError> {
        for step in &self.step {
            if step.action.needs_account() {
                step.account()?;
            }
            if step.action.needs_amount() {
                step.amount()?;
            }
        }
        Ok(())
    }
}
