// CSV/TSV import and plain CSV report export

use std::path::Path;

use romaneio_recon::{Cell, Grid, RawRow};

/// Import with the delimiter sniffed from the first lines.
pub fn import(path: &Path) -> Result<Grid, String> {
    let text = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&text);
    tracing::debug!(
        path = %path.display(),
        delimiter = %(delimiter as char).escape_default(),
        "sniffed delimiter"
    );
    import_from_string(&text, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Grid, String> {
    import_with_delimiter(path, b'\t')
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Grid, String> {
    import_from_string(&read_file_as_utf8(path)?, delimiter)
}

/// Delimiters tried when sniffing, in tie-break order.
const DELIMITERS: [u8; 4] = [b';', b'\t', b',', b'|'];

/// Lines looked at when sniffing.
const SNIFF_LINES: usize = 10;

/// Pick the delimiter whose rows agree most on a multi-field width.
///
/// A candidate scores `width * rows_with_that_width` over the first non-blank
/// lines. Single-field lines never set the width: route manifests open with a
/// one-cell title row. Falls back to comma when no candidate splits anything.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    DELIMITERS
        .iter()
        .filter_map(|&delim| {
            let widths: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();
            let width = most_common_width(&widths)?;
            let agreeing = widths.iter().filter(|&&w| w == width).count();
            Some((delim, width * agreeing))
        })
        .fold(None, |best: Option<(u8, usize)>, (delim, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((delim, score)),
        })
        .map(|(delim, _)| delim)
        .unwrap_or(b',')
}

/// Fields in one line under `delim`, honouring quotes.
fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

fn most_common_width(widths: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for &w in widths.iter().filter(|&&w| w > 1) {
        let n = widths.iter().filter(|&&x| x == w).count();
        if best.map_or(true, |(_, best_n)| n > best_n) {
            best = Some((w, n));
        }
    }
    best.map(|(w, _)| w)
}

/// File contents as UTF-8. Bytes that are not valid UTF-8 are read as
/// Windows-1252, which is what Excel writes for Portuguese CSV exports. A
/// leading BOM is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let raw = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;

    let text = String::from_utf8(raw).unwrap_or_else(|err| {
        tracing::debug!(path = %path.display(), "file is not UTF-8, decoded as Windows-1252");
        encoding_rs::WINDOWS_1252.decode(err.as_bytes()).0.into_owned()
    });
    match text.strip_prefix('\u{feff}') {
        Some(rest) => Ok(rest.to_string()),
        None => Ok(text),
    }
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Grid, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Grid::default();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("line {}: {e}", row_idx + 1))?;
        let cells: Vec<Cell> = record.iter().map(Cell::from_raw).collect();
        grid.push(RawRow::new(cells));
    }
    Ok(grid)
}

/// Write `rows` as comma-separated values. Rows may differ in width.
pub fn export_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    for record in rows {
        writer.write_record(record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
