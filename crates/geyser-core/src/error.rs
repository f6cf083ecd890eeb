// crates/geyser-core/src/error.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Timestamp;

/// Protocol-wide error types for the Geyser staking pool.
///
/// Every failure is synchronous and rolls back the engine's accounting
/// state. Callers that branch on the reason should use [`GeyserError::kind`].
#[derive(Debug, Error)]
pub enum GeyserError {
    /// Zero amounts, amounts above the caller's stake, out-of-range parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Minted or burned shares round down to zero.
    #[error("Dust amount: {0}")]
    DustAmount(String),

    /// Unstake attempted before the most recent stake cleared its lockup.
    #[error("Lockup active: most recent stake unlocks after {unlocks_after}")]
    LockupActive {
        /// The last second at which the most recent stake is still locked.
        unlocks_after: Timestamp,
    },

    /// The shares-versus-staked-balance consistency check failed.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Escrow transfer or treasury release reported failure.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    /// A mutating entry point was invoked while another was in progress.
    #[error("Re-entrant call rejected")]
    Reentrant,

    /// A stored counter or intermediate product left the representable range.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stable, machine-readable reason code for a [`GeyserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    DustAmount,
    LockupActive,
    InvariantViolation,
    Collaborator,
    Reentrant,
    ArithmeticOverflow,
    Config,
    Serialization,
}

impl ErrorKind {
    /// The snake_case code used in logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::DustAmount => "dust_amount",
            ErrorKind::LockupActive => "lockup_active",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::Collaborator => "collaborator_failure",
            ErrorKind::Reentrant => "reentrant",
            ErrorKind::ArithmeticOverflow => "arithmetic_overflow",
            ErrorKind::Config => "config",
            ErrorKind::Serialization => "serialization",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl GeyserError {
    /// The stable reason code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeyserError::InvalidInput(_) => ErrorKind::InvalidInput,
            GeyserError::DustAmount(_) => ErrorKind::DustAmount,
            GeyserError::LockupActive { .. } => ErrorKind::LockupActive,
            GeyserError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            GeyserError::Collaborator(_) => ErrorKind::Collaborator,
            GeyserError::Reentrant => ErrorKind::Reentrant,
            GeyserError::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            GeyserError::Config(_) => ErrorKind::Config,
            GeyserError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl From<serde_json::Error> for GeyserError {
    fn from(e: serde_json::Error) -> Self {
        GeyserError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for GeyserError {
    fn from(e: toml::de::Error) -> Self {
        GeyserError::Config(e.to_string())
    }
}
