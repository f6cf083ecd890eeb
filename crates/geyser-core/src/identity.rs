// crates/geyser-core/src/identity.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw token amount in the smallest unit of the asset.
pub type Amount = u128;

/// Internal staking shares (proportional ownership of the staked pool).
pub type Shares = u128;

/// Accrued shares multiplied by seconds held.
pub type ShareSeconds = u128;

/// Wall-clock time in seconds. Passed explicitly into every call.
pub type Timestamp = u64;

/// Identity of an account that holds tokens or stake.
///
/// Stakers, escrow vaults, and the treasury all live in the same namespace,
/// so a vault can be addressed exactly like a user when moving tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account identity from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The account name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AccountId {
    fn from(name: String) -> Self {
        Self(name)
    }
}
