//! Output formatting for ledger listings.

use crate::error::CliError;
use chrono::DateTime;
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use pao_core::LedgerEntry;
use serde_json::{json, Value};

/// Output format for `list-migrations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    #[default]
    Json,
    /// ASCII table
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Render ledger entries in the requested format.
pub fn format_ledger(entries: &[LedgerEntry], format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<Value> = entries.iter().map(entry_to_json).collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Table => Ok(format_table(entries)),
    }
}

fn entry_to_json(entry: &LedgerEntry) -> Value {
    json!({
        "migration_number": entry.migration_number,
        "migration_name": entry.migration_name,
        "migration_filename": entry.migration_filename,
        "created_at": format_timestamp(entry.created_at),
        "updated_at": format_timestamp(entry.updated_at),
    })
}

fn format_table(entries: &[LedgerEntry]) -> String {
    if entries.is_empty() {
        return "No migrations applied".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("name"),
        Cell::new("filename"),
        Cell::new("applied at"),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.migration_number),
            Cell::new(&entry.migration_name),
            Cell::new(&entry.migration_filename),
            Cell::new(format_timestamp(entry.created_at)),
        ]);
    }

    format!("{}\n{} migration(s)", table, entries.len())
}

/// RFC 3339 rendering of a seconds-since-epoch timestamp.
fn format_timestamp(seconds: f64) -> String {
    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| seconds.to_string())
}
