//! Output formatters for command results.

use chrono::{DateTime, SecondsFormat};
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde::Serialize;
use serde_json::json;
use tradebook_core::{DeleteSummary, MigrationStatus, Row, TableDef};

use crate::commands::Stats;
use crate::error::Error;
use crate::seed::SeedReport;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format rows of one table, columns in schema order.
    fn format_rows(&self, table: &TableDef, rows: &[Row]) -> String;

    /// Format the rows removed by a delete.
    fn format_deleted(&self, summary: &DeleteSummary) -> String;

    /// Format migration state.
    fn format_migrations(&self, status: &[MigrationStatus]) -> String;

    /// Format record counts.
    fn format_stats(&self, stats: &Stats) -> String;

    /// Format the outcome of a seed run.
    fn format_seed(&self, report: &SeedReport) -> String;

    /// Format an error.
    fn format_error(&self, error: &Error) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Render a microsecond timestamp as RFC 3339.
pub fn format_timestamp(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nanos = ((micros % 1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| micros.to_string())
}

fn cell_text(row: &Row, column: &str) -> String {
    match column {
        "id" => row.id.to_string(),
        "created_at" => format_timestamp(row.created_at),
        "updated_at" => format_timestamp(row.updated_at),
        _ => row.get(column).map(ToString::to_string).unwrap_or_default(),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_rows(&self, table: &TableDef, rows: &[Row]) -> String {
        if rows.is_empty() {
            return format!("No {}", table.name);
        }

        let columns: Vec<&str> = table.fields.iter().map(|f| f.name.as_str()).collect();
        let mut output = Table::new();
        output.set_header(columns.iter().map(|c| Cell::new(c)));
        for row in rows {
            output.add_row(columns.iter().map(|c| Cell::new(cell_text(row, c))));
        }

        format!("{}\n({} row{})", output, rows.len(), plural(rows.len()))
    }

    fn format_deleted(&self, summary: &DeleteSummary) -> String {
        let Some((table, id)) = summary.deleted.last() else {
            return "Nothing deleted".to_string();
        };
        let cascaded = summary.cascaded();
        if cascaded.is_empty() {
            format!("Deleted {} {}", table, id)
        } else {
            format!(
                "Deleted {} {} and {} dependent row{}",
                table,
                id,
                cascaded.len(),
                plural(cascaded.len())
            )
        }
    }

    fn format_migrations(&self, status: &[MigrationStatus]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Version", "Name", "Status"]);
        for migration in status {
            table.add_row(vec![
                Cell::new(migration.version),
                Cell::new(migration.name),
                Cell::new(if migration.applied { "up" } else { "down" }),
            ]);
        }
        table.to_string()
    }

    fn format_stats(&self, stats: &Stats) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Metric", "Count"]);
        table.add_row(vec![Cell::new("clients"), Cell::new(stats.clients)]);
        table.add_row(vec![Cell::new("active clients"), Cell::new(stats.active_clients)]);
        table.add_row(vec![Cell::new("vendors"), Cell::new(stats.vendors)]);
        table.add_row(vec![
            Cell::new("vendors on promotion"),
            Cell::new(stats.vendors_on_promotion),
        ]);
        table.add_row(vec![Cell::new("orders"), Cell::new(stats.orders)]);
        table.add_row(vec![Cell::new("bytes on disk"), Cell::new(stats.disk_bytes)]);
        table.to_string()
    }

    fn format_seed(&self, report: &SeedReport) -> String {
        format!(
            "Seeded {} client{} and {} vendor{} ({} already present)",
            report.clients,
            plural(report.clients),
            report.vendors,
            plural(report.vendors),
            report.skipped
        )
    }

    fn format_error(&self, error: &Error) -> String {
        match error {
            Error::Core(tradebook_core::Error::Validation(errors)) => {
                let mut output = String::from("Error: validation failed");
                for e in errors {
                    output.push_str("\n  - ");
                    output.push_str(&e.to_string());
                }
                output
            }
            _ => format!("Error: {}", error),
        }
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    }

    fn row_to_json(table: &TableDef, row: &Row) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for field in &table.fields {
            let value = match field.name.as_str() {
                "id" => json!(row.id),
                "created_at" => json!(format_timestamp(row.created_at)),
                "updated_at" => json!(format_timestamp(row.updated_at)),
                name => row
                    .get(name)
                    .and_then(|v| serde_json::to_value(v).ok())
                    .unwrap_or(serde_json::Value::Null),
            };
            obj.insert(field.name.clone(), value);
        }
        serde_json::Value::Object(obj)
    }
}

impl Formatter for JsonFormatter {
    fn format_rows(&self, table: &TableDef, rows: &[Row]) -> String {
        let rows: Vec<_> = rows.iter().map(|r| Self::row_to_json(table, r)).collect();
        Self::pretty(&rows)
    }

    fn format_deleted(&self, summary: &DeleteSummary) -> String {
        let deleted: Vec<_> = summary
            .deleted
            .iter()
            .map(|(table, id)| json!({ "table": table, "id": id }))
            .collect();
        Self::pretty(&json!({ "deleted": deleted }))
    }

    fn format_migrations(&self, status: &[MigrationStatus]) -> String {
        Self::pretty(status)
    }

    fn format_stats(&self, stats: &Stats) -> String {
        Self::pretty(stats)
    }

    fn format_seed(&self, report: &SeedReport) -> String {
        Self::pretty(report)
    }

    fn format_error(&self, error: &Error) -> String {
        match error {
            Error::Core(tradebook_core::Error::Validation(errors)) => {
                json!({ "error": "validation failed", "violations": errors }).to_string()
            }
            _ => json!({ "error": error.to_string() }).to_string(),
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
