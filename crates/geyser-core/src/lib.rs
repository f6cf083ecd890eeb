// crates/geyser-core/src/lib.rs
//
// geyser-core: Core types, errors, events, and collaborator traits for the
// Geyser time-weighted staking pool.
//
// This is the leaf crate of the workspace. It defines the identity and
// amount types, the protocol-wide error enum, the audit events emitted by
// the accounting engine, and the trait interfaces the engine uses to talk
// to token custody (escrow), the funding treasury, and fee policies.

pub mod error;
pub mod event;
pub mod identity;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use geyser_core::AccountId;`

// Identity and amount types
pub use identity::{AccountId, Amount, Shares, ShareSeconds, Timestamp};

// Events
pub use event::{EventKind, GeyserEvent};

// Error type
pub use error::{ErrorKind, GeyserError};

// Traits
pub use traits::{FeePolicy, FundingSource, TokenEscrow};
