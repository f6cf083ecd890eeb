// crates/geyser-cli/src/commands/mod.rs
//
// Command module declarations for the Geyser CLI.

pub mod check_config;
pub mod curve;
pub mod simulate;
