// crates/geyser-core/src/event.rs
//
// Audit events emitted by the accounting engine.
//
// Every event carries the acting account, the amount moved, the resulting
// total for that actor, and the caller-supplied annotation. The meaning of
// `total` depends on the kind:
//   - Staked / Unstaked / RewardClaimed: the actor's stake value afterwards
//   - FundsLocked: the treasury principal afterwards
//   - FundsUnlocked: the reward pool balance afterwards

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::{AccountId, Amount, Timestamp};

/// The kind of state transition an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Staked,
    Unstaked,
    RewardClaimed,
    FundsLocked,
    FundsUnlocked,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Staked => write!(f, "Staked"),
            EventKind::Unstaked => write!(f, "Unstaked"),
            EventKind::RewardClaimed => write!(f, "RewardClaimed"),
            EventKind::FundsLocked => write!(f, "FundsLocked"),
            EventKind::FundsUnlocked => write!(f, "FundsUnlocked"),
        }
    }
}

/// A single committed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeyserEvent {
    pub kind: EventKind,
    /// The account that triggered the transition (the treasury for unlocks).
    pub actor: AccountId,
    /// Amount moved by the transition.
    pub amount: Amount,
    /// Resulting total for the actor; see module docs.
    pub total: Amount,
    /// Free-form annotation supplied by the caller.
    pub data: String,
    /// Time at which the transition was committed.
    pub at: Timestamp,
}

impl GeyserEvent {
    pub fn new(
        kind: EventKind,
        actor: AccountId,
        amount: Amount,
        total: Amount,
        data: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            kind,
            actor,
            amount,
            total,
            data: data.into(),
            at,
        }
    }
}

impl fmt::Display for GeyserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} actor={} amount={} total={}",
            self.at, self.kind, self.actor, self.amount, self.total
        )?;
        if !self.data.is_empty() {
            write!(f, " data={:?}", self.data)?;
        }
        Ok(())
    }
}
