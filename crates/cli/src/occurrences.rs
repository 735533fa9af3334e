//! `romaneio occurrences` and `romaneio latest`: row filters over a single
//! export.

use std::path::Path;

use romaneio_recon::occurrence::OccurrenceRow;
use romaneio_recon::status::LatestEntry;
use romaneio_recon::{run_latest, run_occurrences, TracingSink};

use crate::export::{self, field_columns, field_values, OutputArgs};
use crate::{load_config, load_grid, CliError};

pub fn cmd_occurrences(config_path: Option<&Path>, file: &Path, output: &OutputArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let grid = load_grid(file)?;
    let report = run_occurrences(&config, &grid, &mut TracingSink).map_err(CliError::recon)?;

    export::write_report(&report, output)?;
    if let Some(ref path) = output.csv {
        export::write_csv(path, &occurrence_csv_rows(&report.rows))?;
    }
    if !output.json {
        let table: Vec<Vec<String>> = report
            .rows
            .iter()
            .map(|r| vec![r.reference.clone(), r.occurrence.label().to_string(), r.service_type.clone()])
            .collect();
        export::print_table(&["REFERENCE", "OCCURRENCE", "SERVICE"], &table);
    }

    eprintln!(
        "kept {} of {} occurrence rows",
        report.summary.kept, report.summary.input_rows
    );
    Ok(())
}

pub fn cmd_latest(config_path: Option<&Path>, file: &Path, output: &OutputArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let grid = load_grid(file)?;
    let report = run_latest(&config, &grid).map_err(CliError::recon)?;

    export::write_report(&report, output)?;
    if let Some(ref path) = output.csv {
        export::write_csv(path, &latest_csv_rows(&report.entries))?;
    }
    if !output.json {
        let table: Vec<Vec<String>> = report
            .entries
            .iter()
            .map(|e| vec![e.code.clone(), e.timestamp.to_string()])
            .collect();
        export::print_table(&["CODE", "TIMESTAMP"], &table);
    }

    eprintln!("{} codes from {} status rows", report.entries.len(), report.input_rows);
    Ok(())
}

/// Canonical columns first, then every source column.
fn occurrence_csv_rows(rows: &[OccurrenceRow]) -> Vec<Vec<String>> {
    let columns = field_columns(rows.iter().map(|r| &r.fields));
    let mut header = vec!["reference".to_string(), "occurrence".to_string(), "service_type".to_string()];
    header.extend(columns.iter().cloned());

    let mut out = vec![header];
    for row in rows {
        let mut line = vec![row.reference.clone(), row.occurrence.label().to_string(), row.service_type.clone()];
        line.extend(field_values(&row.fields, &columns));
        out.push(line);
    }
    out
}

fn latest_csv_rows(entries: &[LatestEntry]) -> Vec<Vec<String>> {
    let columns = field_columns(entries.iter().map(|e| &e.fields));
    let mut header = vec!["code".to_string(), "timestamp".to_string()];
    header.extend(columns.iter().cloned());

    let mut out = vec![header];
    for entry in entries {
        let mut line = vec![entry.code.clone(), entry.timestamp.to_string()];
        line.extend(field_values(&entry.fields, &columns));
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use romaneio_recon::{Grid, NullSink, ReconConfig};

    #[test]
    fn occurrence_csv_carries_source_columns() {
        let grid = Grid::from_rows(&[
            vec!["Referência", "Ocorrência", "Tipo de Serviço", "Cliente"],
            vec!["R1", "coletado", "Coleta", "Loja A"],
        ]);
        let report = run_occurrences(&ReconConfig::default(), &grid, &mut NullSink).unwrap();
        let rows = occurrence_csv_rows(&report.rows);

        assert_eq!(rows[0][..3], ["reference", "occurrence", "service_type"]);
        assert!(rows[0].contains(&"Cliente".to_string()));
        assert_eq!(rows[1][1], "Coletado");
        let cliente = rows[0].iter().position(|h| h == "Cliente").unwrap();
        assert_eq!(rows[1][cliente], "Loja A");
    }

    #[test]
    fn latest_csv_has_one_line_per_code() {
        let grid = Grid::from_rows(&[
            vec!["Código", "Horários (execução) - Concluído", "F"],
            vec!["1", "15/03/2024 10:00", "old"],
            vec!["1", "15/03/2024 11:00", "new"],
            vec!["2", "15/03/2024 09:00", "only"],
        ]);
        let report = run_latest(&ReconConfig::default(), &grid).unwrap();
        let rows = latest_csv_rows(&report.entries);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "1");
        assert_eq!(rows[1][1], "2024-03-15 11:00:00");
        assert!(rows[1].contains(&"new".to_string()));
    }
}
