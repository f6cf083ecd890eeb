// crates/geyser-cli/src/config.rs
//
// CLI configuration: the pool table plus display and logging settings.

use std::fs;

use geyser_core::GeyserError;
use geyser_economics::PoolConfig;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Pool parameters, under `[pool]`.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fractional digits used when printing token amounts.
    #[serde(default)]
    pub decimals: u32,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            log_level: default_log_level(),
            decimals: 0,
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, GeyserError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| GeyserError::Config(format!("cannot read {}: {}", path, e)))?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
