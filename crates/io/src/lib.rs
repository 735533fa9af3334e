// Spreadsheet decoding into reconciliation grids

use std::path::Path;

use romaneio_recon::Grid;

pub mod csv;
pub mod json;
pub mod xlsx;

/// Input format, decided from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Tsv,
    Excel,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Format::Csv),
            "tsv" | "tab" => Some(Format::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Format::Excel),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Decode any supported file into a grid. Only the first sheet of a workbook is read.
pub fn load_grid(path: &Path) -> Result<Grid, String> {
    let format = Format::from_path(path).ok_or_else(|| {
        format!(
            "unsupported file type: {} (expected .csv, .tsv, .xlsx, .xls, .ods or .json)",
            path.display()
        )
    })?;
    let grid = match format {
        Format::Csv => csv::import(path)?,
        Format::Tsv => csv::import_tsv(path)?,
        Format::Excel => xlsx::import(path)?,
        Format::Json => json::import(path)?,
    };
    tracing::debug!(path = %path.display(), ?format, rows = grid.len(), "decoded grid");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/b.CSV")), Some(Format::Csv));
        assert_eq!(Format::from_path(Path::new("rotas.xlsx")), Some(Format::Excel));
        assert_eq!(Format::from_path(Path::new("x.tsv")), Some(Format::Tsv));
        assert_eq!(Format::from_path(Path::new("x.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("x.pdf")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn load_grid_dispatches_on_extension() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("a.csv");
        fs::write(&csv_path, "Pedido;Status\n1;ok\n").unwrap();
        assert_eq!(load_grid(&csv_path).unwrap().len(), 2);

        let json_path = dir.path().join("a.json");
        fs::write(&json_path, r#"[["Pedido"], ["1"], ["2"]]"#).unwrap();
        assert_eq!(load_grid(&json_path).unwrap().len(), 3);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_grid(Path::new("report.pdf")).unwrap_err();
        assert!(err.contains("unsupported file type"), "{err}");
    }
}
