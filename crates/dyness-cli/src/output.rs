//! Output formatting: table or JSON.
//!
//! Table rendering uses `tabled`; JSON serializes the original data via
//! serde. Unavailable readings render dimmed when stdout is a terminal.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use dyness_core::{Snapshot, registry};

use crate::cli::OutputFormat;

/// One rendered reading row.
#[derive(Debug, Serialize, Tabled)]
pub struct ReadingRow {
    #[tabled(rename = "Reading")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Unit")]
    pub unit: String,
}

/// Registry metadata row for `dyness readings`.
#[derive(Debug, Serialize, Tabled)]
pub struct RegistryRow {
    #[tabled(rename = "Id")]
    pub id: &'static str,
    #[tabled(rename = "Name")]
    pub name: &'static str,
    #[tabled(rename = "Unit")]
    pub unit: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
}

fn use_color() -> bool {
    io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
}

/// Evaluate the full registry against a snapshot.
pub fn reading_rows(snapshot: &Snapshot) -> Vec<ReadingRow> {
    let color = use_color();
    registry()
        .iter()
        .map(|r| {
            let value = match r.value(snapshot) {
                Some(v) => v.to_string(),
                None if color => "unavailable".dimmed().to_string(),
                None => "unavailable".to_owned(),
            };
            ReadingRow {
                name: r.name.to_owned(),
                value,
                unit: r.unit.unwrap_or("").to_owned(),
            }
        })
        .collect()
}

pub fn registry_rows() -> Vec<RegistryRow> {
    registry()
        .iter()
        .map(|r| RegistryRow {
            id: r.id,
            name: r.name,
            unit: r.unit.unwrap_or("").to_owned(),
            kind: r.kind.to_string(),
        })
        .collect()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of rows in the chosen format.
pub fn render_list<R>(format: OutputFormat, rows: &[R]) -> String
where
    R: Tabled + Serialize,
{
    match format {
        OutputFormat::Table => render_table(rows),
        OutputFormat::Json => render_json(rows),
    }
}

/// Render a single serializable item; table mode uses `detail_fn` for a
/// pre-formatted detail view.
pub fn render_single<T>(format: OutputFormat, data: &T, detail_fn: impl Fn(&T) -> String) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data),
    }
}

/// Print rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}
