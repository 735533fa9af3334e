//! Report output shared by every pipeline command: JSON to stdout and/or a
//! file, plus an optional CSV of the report rows.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

#[derive(Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Print the JSON report to stdout instead of the table
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to a file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the report rows as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

/// Serialize `report` once and send it where the flags ask.
pub fn write_report<T: Serialize>(report: &T, args: &OutputArgs) -> Result<(), CliError> {
    if !args.json && args.output.is_none() {
        return Ok(());
    }

    let json_str = serde_json::to_string_pretty(report).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    }
    Ok(())
}

pub fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<(), CliError> {
    romaneio_io::csv::export_rows(path, rows).map_err(CliError::io)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

/// Union of source column names across records, sorted.
pub fn field_columns<'a>(records: impl IntoIterator<Item = &'a BTreeMap<String, String>>) -> Vec<String> {
    let names: BTreeSet<&String> = records.into_iter().flat_map(|r| r.keys()).collect();
    names.into_iter().cloned().collect()
}

/// Values of `columns` from one record, empty where absent.
pub fn field_values(record: &BTreeMap<String, String>, columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| record.get(c).cloned().unwrap_or_default()).collect()
}

/// Left-aligned fixed-width table on stdout.
pub fn print_table(header: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    println!("{}", pad_line(header.iter().copied(), &widths));
    for row in rows {
        println!("{}", pad_line(row.iter().map(String::as_str), &widths));
    }
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell}{}", " ".repeat(w.saturating_sub(cell.chars().count()))))
        .collect();
    padded.join("  ").trim_end().to_string()
}
