// crates/geyser-cli/src/commands/check_config.rs
//
// `geyser check-config`: validate the pool table and print the parameters
// the engine would run with.

use geyser_economics::{BonusCurve, PoolParams, BASIS_POINTS};
use serde::Serialize;
use tabled::Tabled;

use crate::config::CliConfig;
use crate::output::{section, OutputFormat};

#[derive(Debug, Serialize)]
struct ConfigReport {
    params: PoolParams,
    fee_policy: &'static str,
    log_level: String,
    decimals: u32,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Run the check-config subcommand.
pub async fn run(config: &CliConfig, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let params = config.pool.params()?;
    let curve = params.bonus_curve()?;
    let fee = config.pool.fee_policy()?;
    tracing::debug!("Configuration valid: {:?}", params);

    let report = ConfigReport {
        params,
        fee_policy: fee.name(),
        log_level: config.log_level.clone(),
        decimals: config.decimals,
    };

    format.emit(&report, |report| {
        format!("{}\n\nConfiguration OK.", section("", &rows(report, &curve)))
    })?;
    Ok(())
}

fn rows(report: &ConfigReport, curve: &BonusCurve) -> Vec<SettingRow> {
    let params = &report.params;
    vec![
        SettingRow {
            name: "start_bonus",
            value: format!(
                "{} bp ({}%)",
                curve.start_bonus_bp(),
                curve.start_bonus_bp() * 100 / BASIS_POINTS
            ),
        },
        SettingRow {
            name: "bonus_period_sec",
            value: params.bonus_period_sec.to_string(),
        },
        SettingRow {
            name: "initial_shares_per_token",
            value: params.initial_shares_per_token.to_string(),
        },
        SettingRow {
            name: "lockup_sec",
            value: params.lockup_sec.to_string(),
        },
        SettingRow {
            name: "max_stakes_per_account",
            value: params.max_stakes_per_account.to_string(),
        },
        SettingRow {
            name: "fee_policy",
            value: report.fee_policy.to_string(),
        },
        SettingRow {
            name: "decimals",
            value: report.decimals.to_string(),
        },
    ]
}
