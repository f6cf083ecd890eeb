// crates/geyser-core/src/traits.rs
//
// Contracts between the accounting engine and its external collaborators.
// The engine owns boxed trait objects, so every collaborator must be
// `Send + Sync` to live behind the shared async handle.

use crate::error::GeyserError;
use crate::identity::{AccountId, Amount};

/// Custody of a single asset on behalf of the pool.
///
/// Implemented by geyser-economics (`BankEscrow`). Mutating calls either
/// move the full amount or fail with `GeyserError::Collaborator`.
pub trait TokenEscrow: Send + Sync {
    /// The vault account this escrow holds its balance under.
    fn account(&self) -> &AccountId;

    /// Pull `amount` from `payer` into the escrow.
    fn deposit_from(&mut self, payer: &AccountId, amount: Amount) -> Result<(), GeyserError>;

    /// Pay `amount` out of the escrow to `recipient`.
    fn pay_out(&mut self, recipient: &AccountId, amount: Amount) -> Result<(), GeyserError>;

    /// Current escrowed balance.
    fn balance(&self) -> Amount;
}

/// Funding source for the reward pool.
///
/// Holds a locked principal that can never be released; only the surplus
/// above it (interest or yield) is available. Implemented by
/// geyser-economics (`PrincipalTreasury`).
pub trait FundingSource: Send + Sync {
    /// The account the treasury holds its balance under.
    fn account(&self) -> &AccountId;

    /// Funds above the principal that may be released right now.
    fn funds_available(&self) -> Amount;

    /// The non-withdrawable principal.
    fn principal(&self) -> Amount;

    /// Add `amount` from `funder` to the principal. Returns the new principal.
    fn lock(&mut self, funder: &AccountId, amount: Amount) -> Result<Amount, GeyserError>;

    /// Move every available unit to `beneficiary`. Returns the amount moved;
    /// zero when nothing is available.
    fn release(&mut self, beneficiary: &AccountId) -> Result<Amount, GeyserError>;
}

/// Deposit fee rule, selected per deployment.
///
/// Implementations must be pure: the same input always yields the same
/// output and `apply_fee(amount) <= amount`.
pub trait FeePolicy: Send + Sync {
    /// Net amount credited for a gross deposit of `amount`.
    fn apply_fee(&self, amount: Amount) -> Amount;

    /// Short identifier for logs and summaries.
    fn name(&self) -> &'static str;
}
