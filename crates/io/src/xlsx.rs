// Excel import (xlsx, xls, xlsb, ods), first sheet only

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use romaneio_recon::datetime::from_excel_serial;
use romaneio_recon::grid::MAX_COLUMNS;
use romaneio_recon::{Cell, Grid, RawRow};

/// Largest sheet xlsx can hold (1,048,576 rows by column XFD)
const MAX_ROWS: usize = 1_048_576;

/// Import the first worksheet of an Excel file.
pub fn import(path: &Path) -> Result<Grid, String> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "Excel file contains no sheets".to_string())?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    // Range start offset (data may not begin at A1). Leading rows are kept
    // as empty rows so positions match the sheet.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (height, width) = range.get_size();
    check_size(&sheet_name, start_row as usize + height, start_col as usize + width)?;

    let mut grid = Grid::default();
    for _ in 0..start_row {
        grid.push(RawRow::default());
    }

    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(convert));
        grid.push(RawRow::new(cells));
    }

    tracing::debug!(sheet = %sheet_name, rows = grid.len(), "excel sheet decoded");
    Ok(grid)
}

/// Reject sheets past the xlsx limits rather than dropping rows.
fn check_size(sheet: &str, rows: usize, cols: usize) -> Result<(), String> {
    if rows > MAX_ROWS || cols > MAX_COLUMNS {
        return Err(format!(
            "Sheet '{}' is {}x{}, larger than the {}x{} limit",
            sheet, rows, cols, MAX_ROWS, MAX_COLUMNS
        ));
    }
    Ok(())
}

fn convert(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_raw(s),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => {
            // 1900 date system assumed
            let serial = dt.as_f64();
            match from_excel_serial(serial) {
                Some(ts) => Cell::Text(ts.format("%d/%m/%Y %H:%M:%S").to_string()),
                None => Cell::Number(serial),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_raw(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use romaneio_recon::datetime;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    #[test]
    fn test_first_sheet_is_imported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Código").unwrap();
        sheet.write_string(0, 1, "Situação - Finalizado").unwrap();
        sheet.write_number(1, 0, 1001.0).unwrap();
        sheet.write_string(1, 1, "Sucesso").unwrap();
        sheet.write_number(2, 0, 12.5).unwrap();
        let other = workbook.add_worksheet();
        other.write_string(0, 0, "ignored").unwrap();
        workbook.save(&path).unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.rows()[0].text(0).as_deref(), Some("Código"));
        assert_eq!(grid.rows()[1].get(0).to_text(), "1001");
        assert_eq!(grid.rows()[1].text(1).as_deref(), Some("Sucesso"));
        assert_eq!(grid.rows()[2].get(0).to_text(), "12.5");
    }

    #[test]
    fn test_date_cells_parse_back_to_the_same_instant() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Horários (execução) - Concluído").unwrap();
        sheet.write_number_with_format(1, 0, 45366.5, &date_format).unwrap();
        workbook.save(&path).unwrap();

        let grid = import(&path).unwrap();
        let text = grid.rows()[1].get(0).to_text();
        let parsed = datetime::parse(&text);
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-03-15 12:00");
    }

    #[test]
    fn test_data_offset_keeps_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 6, "1001").unwrap();
        workbook.save(&path).unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.len(), 3);
        assert!(grid.rows()[0].is_empty());
        assert_eq!(grid.rows()[2].text(6).as_deref(), Some("1001"));
    }

    #[test]
    fn test_rows_past_65536_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Código").unwrap();
        sheet.write_string(70_000, 0, "1001").unwrap();
        sheet.write_string(70_000, 300, "far right").unwrap();
        workbook.save(&path).unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.len(), 70_001);
        assert_eq!(grid.rows()[70_000].text(0).as_deref(), Some("1001"));
        assert_eq!(grid.rows()[70_000].text(300).as_deref(), Some("far right"));
    }

    #[test]
    fn test_oversize_sheet_is_an_error() {
        assert!(check_size("Plan1", MAX_ROWS, MAX_COLUMNS).is_ok());
        let err = check_size("Plan1", MAX_ROWS + 1, 1).unwrap_err();
        assert!(err.contains("Plan1") && err.contains("1048577x1"), "{err}");
        assert!(check_size("Plan1", 1, MAX_COLUMNS + 1).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = import(Path::new("/nonexistent/rotas.xlsx")).unwrap_err();
        assert!(err.starts_with("Failed to open Excel file"), "{err}");
    }
}
