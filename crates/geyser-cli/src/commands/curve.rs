// crates/geyser-cli/src/commands/curve.rs
//
// `geyser curve`: the bonus fraction a redeemed chunk earns by how long it
// was held, sampled evenly across the bonus period.

use clap::Args;
use geyser_economics::{format_amount, BonusCurve};
use serde::Serialize;
use tabled::Tabled;

use crate::config::CliConfig;
use crate::output::{section, OutputFormat};

const SECONDS_PER_DAY: u128 = 86_400;

#[derive(Debug, Args)]
pub struct CurveCmd {
    /// Number of intervals to sample across the bonus period.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct CurvePoint {
    held_sec: u64,
    bonus_bp: u128,
}

#[derive(Tabled)]
struct CurveRow {
    #[tabled(rename = "Held (s)")]
    held_sec: u64,
    #[tabled(rename = "Held (days)")]
    held_days: String,
    #[tabled(rename = "Bonus")]
    bonus: String,
}

impl From<CurvePoint> for CurveRow {
    fn from(point: CurvePoint) -> Self {
        Self {
            held_sec: point.held_sec,
            held_days: format_amount(u128::from(point.held_sec) * 100 / SECONDS_PER_DAY, 2),
            bonus: format!("{}%", format_amount(point.bonus_bp, 2)),
        }
    }
}

/// Run the curve subcommand.
pub async fn run(
    cmd: &CurveCmd,
    config: &CliConfig,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let curve = config.pool.params()?.bonus_curve()?;
    let points = sample(&curve, cmd.points);

    format.emit(&points, |points| {
        let rows: Vec<CurveRow> = points.iter().copied().map(CurveRow::from).collect();
        section("", &rows)
    })?;
    Ok(())
}

/// `intervals + 1` evenly spaced points from zero to the full bonus period.
fn sample(curve: &BonusCurve, intervals: u32) -> Vec<CurvePoint> {
    let period = u128::from(curve.bonus_period_sec());
    let intervals = u128::from(intervals.max(1));
    (0..=intervals)
        .map(|i| {
            // i <= intervals, so the result never exceeds the period.
            let held_sec = (period * i / intervals) as u64;
            CurvePoint {
                held_sec,
                bonus_bp: curve.bonus_bp(held_sec),
            }
        })
        .collect()
}
