// crates/geyser-cli/src/output.rs
//
// Every subcommand builds one serializable report. `--format json` prints
// the report as-is; `--format table` hands it to the command's own layout,
// which is assembled from titled sections.

use clap::ValueEnum;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable sections (default).
    Table,
    /// The full report as pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Print `report` in this format. `layout` renders the table view and
    /// is only called for [`OutputFormat::Table`].
    pub fn emit<T, F>(self, report: &T, layout: F) -> Result<(), serde_json::Error>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Table => println!("{}", layout(report)),
        }
        Ok(())
    }
}

/// `rows` as a sharp-bordered table under a `title` line. An empty title
/// yields the bare table.
pub fn section<R: Tabled>(title: &str, rows: &[R]) -> String {
    let table = Table::new(rows).with(Style::sharp()).to_string();
    if title.is_empty() {
        table
    } else {
        format!("{}\n{}", title, table)
    }
}
