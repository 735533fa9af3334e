//! `romaneio compare`: order-number cross-check between exports.

use std::path::{Path, PathBuf};

use romaneio_recon::compare::ComparisonResult;
use romaneio_recon::{run_compare, Grid};

use crate::exit_codes::EXIT_RECON_UNMATCHED;
use crate::export::{self, OutputArgs};
use crate::{load_config, load_grid, CliError};

/// Two primary exports is the most the comparison merges.
const MAX_PRIMARIES: usize = 2;

pub fn cmd_compare(
    config_path: Option<&Path>,
    secondary: &Path,
    primaries: &[PathBuf],
    strict: bool,
    output: &OutputArgs,
) -> Result<(), CliError> {
    if primaries.len() > MAX_PRIMARIES {
        return Err(CliError::args(format!(
            "at most {MAX_PRIMARIES} --primary files are accepted, got {}",
            primaries.len()
        )));
    }

    let config = load_config(config_path)?;
    let primary_grids = primaries.iter().map(|p| load_grid(p)).collect::<Result<Vec<_>, _>>()?;
    let secondary_grid = load_grid(secondary)?;
    let primary_refs: Vec<&Grid> = primary_grids.iter().collect();

    let report = run_compare(&config, &primary_refs, &secondary_grid).map_err(CliError::recon)?;

    export::write_report(&report, output)?;
    if let Some(ref path) = output.csv {
        export::write_csv(path, &csv_rows(&report.results))?;
    }
    if !output.json {
        export::print_table(&["ORDER", "OUTCOME"], &table_rows(&report.results));
    }

    let s = &report.summary;
    eprintln!(
        "{} order numbers: {} matched, {} only in secondary, {} only in primary",
        s.total, s.matched, s.only_in_secondary, s.only_in_primary,
    );

    if strict && report.has_unmatched() {
        return Err(CliError {
            code: EXIT_RECON_UNMATCHED,
            message: format!(
                "{} order numbers are unmatched",
                s.only_in_secondary + s.only_in_primary
            ),
            hint: None,
        });
    }
    Ok(())
}

fn table_rows(results: &[ComparisonResult]) -> Vec<Vec<String>> {
    results
        .iter()
        .map(|r| vec![r.order_number.clone(), r.outcome.label().to_string()])
        .collect()
}

fn csv_rows(results: &[ComparisonResult]) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["order_number".to_string(), "outcome".to_string()]];
    rows.extend(table_rows(results));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use romaneio_recon::compare::ComparisonOutcome;

    #[test]
    fn csv_uses_staff_labels() {
        let results = vec![
            ComparisonResult { order_number: "2".into(), outcome: ComparisonOutcome::Matched },
            ComparisonResult { order_number: "4".into(), outcome: ComparisonOutcome::OnlyInSecondarySource },
        ];
        let rows = csv_rows(&results);
        assert_eq!(rows[0], vec!["order_number", "outcome"]);
        assert_eq!(rows[1], vec!["2", "Recebido"]);
        assert_eq!(rows[2], vec!["4", "Não recebido na base"]);
    }

    #[test]
    fn three_primaries_are_rejected() {
        let primaries: Vec<PathBuf> = ["a.csv", "b.csv", "c.csv"].iter().map(PathBuf::from).collect();
        let err = cmd_compare(None, Path::new("base.csv"), &primaries, false, &OutputArgs::default()).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }
}
