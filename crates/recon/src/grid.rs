//! Decoded spreadsheet data as the engine sees it.
//!
//! A [`Grid`] is row-major and sparse: rows may be shorter than one another
//! and missing cells read as [`Cell::Empty`]. Row order is preserved exactly
//! as decoded.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::ReconError;
use crate::text::fold;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Text cell, or `Empty` for the empty string.
    pub fn from_raw(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    /// Cell rendered as text; numbers without a fraction print as integers.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Non-empty text content, if any.
    pub fn text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_raw(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

// ---------------------------------------------------------------------------
// Column addressing
// ---------------------------------------------------------------------------

pub const COL_A: usize = 0;
pub const COL_B: usize = 1;
pub const COL_G: usize = 6;
pub const COL_H: usize = 7;

/// Widest sheet any supported format can hold (column `XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// Spreadsheet column letters to a 0-based index (`A` = 0, `AA` = 26).
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }
    let mut idx = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        idx = idx.checked_mul(26)?.checked_add(digit)?;
    }
    Some(idx - 1)
}

/// 0-based index to spreadsheet column letters.
pub fn column_letter(mut idx: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

// ---------------------------------------------------------------------------
// RawRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<Cell>,
}

impl RawRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn from_strs<S: AsRef<str>>(values: &[S]) -> Self {
        Self {
            cells: values.iter().map(|v| Cell::from_raw(v.as_ref())).collect(),
        }
    }

    pub fn get(&self, col: usize) -> &Cell {
        self.cells.get(col).unwrap_or(&EMPTY_CELL)
    }

    /// Look a cell up by column letter. Unknown letters read as empty.
    pub fn col(&self, letters: &str) -> &Cell {
        match column_index(letters) {
            Some(idx) => self.get(idx),
            None => &EMPTY_CELL,
        }
    }

    /// Non-empty text at `col`.
    pub fn text(&self, col: usize) -> Option<String> {
        self.get(col).text()
    }

    pub fn set(&mut self, col: usize, cell: Cell) {
        if col >= self.cells.len() {
            self.cells.resize(col + 1, Cell::Empty);
        }
        self.cells[col] = cell;
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<RawRow>,
}

impl Grid {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        Self {
            rows: rows.iter().map(|r| RawRow::from_strs(r)).collect(),
        }
    }

    /// Build a grid from JSON: an array of arrays, or an array of objects
    /// keyed by column letter (`{"A": "...", "G": "..."}`). `null` rows are
    /// kept as empty rows so row positions stay stable.
    pub fn from_json(value: &Value) -> Result<Self, ReconError> {
        let items = value
            .as_array()
            .ok_or_else(|| ReconError::NotAGrid(format!("expected an array of rows, got {}", json_kind(value))))?;

        let mut rows = Vec::with_capacity(items.len());
        for (row_idx, item) in items.iter().enumerate() {
            let row = match item {
                Value::Null => RawRow::default(),
                Value::Array(values) => {
                    let mut cells = Vec::with_capacity(values.len());
                    for v in values {
                        cells.push(json_cell(v).ok_or_else(|| {
                            ReconError::NotAGrid(format!("row {row_idx}: nested {} in cell", json_kind(v)))
                        })?);
                    }
                    RawRow::new(cells)
                }
                Value::Object(map) => {
                    let mut row = RawRow::default();
                    for (key, v) in map {
                        let col = column_index(key)
                            .or_else(|| key.parse::<usize>().ok())
                            .ok_or_else(|| {
                                ReconError::NotAGrid(format!("row {row_idx}: '{key}' is not a column"))
                            })?;
                        if col >= MAX_COLUMNS {
                            return Err(ReconError::NotAGrid(format!(
                                "row {row_idx}: column '{key}' is past {}",
                                column_letter(MAX_COLUMNS - 1)
                            )));
                        }
                        let cell = json_cell(v).ok_or_else(|| {
                            ReconError::NotAGrid(format!("row {row_idx}: nested {} in cell", json_kind(v)))
                        })?;
                        row.set(col, cell);
                    }
                    row
                }
                other => {
                    return Err(ReconError::NotAGrid(format!(
                        "row {row_idx}: expected array or object, got {}",
                        json_kind(other)
                    )))
                }
            };
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn push(&mut self, row: RawRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn json_cell(value: &Value) -> Option<Cell> {
    match value {
        Value::Null => Some(Cell::Empty),
        Value::String(s) => Some(Cell::from_raw(s)),
        Value::Number(n) => n.as_f64().map(Cell::Number),
        Value::Bool(b) => Some(Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// HeaderTable
// ---------------------------------------------------------------------------

/// A grid whose first row (after `skip` leading rows) names the columns.
#[derive(Debug, Clone)]
pub struct HeaderTable {
    headers: Vec<String>,
    folded: Vec<String>,
    rows: Vec<RawRow>,
    /// Grid row index of the first data row.
    first_row: usize,
}

impl HeaderTable {
    pub fn from_grid(grid: &Grid, skip: usize) -> Self {
        let mut iter = grid.rows().iter().skip(skip);
        let headers: Vec<String> = iter
            .next()
            .map(|r| r.cells().iter().map(|c| c.to_text().trim().to_string()).collect())
            .unwrap_or_default();
        let folded = headers.iter().map(|h| fold(h)).collect();
        Self {
            headers,
            folded,
            rows: iter.cloned().collect(),
            first_row: skip + 1,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// Grid row index (0-based) of the data row at `idx`, for diagnostics.
    pub fn grid_row(&self, idx: usize) -> usize {
        self.first_row + idx
    }

    /// First column whose header matches one of `synonyms`, tried in order.
    /// Matching ignores case, accents and surrounding whitespace.
    pub fn find<S: AsRef<str>>(&self, synonyms: &[S]) -> Option<usize> {
        synonyms.iter().find_map(|syn| {
            let wanted = fold(syn.as_ref());
            self.folded.iter().position(|h| !h.is_empty() && *h == wanted)
        })
    }

    /// Like [`find`](Self::find), but a missing column fails the dataset.
    pub fn require<S: AsRef<str>>(&self, dataset: &str, synonyms: &[S]) -> Result<usize, ReconError> {
        self.find(synonyms).ok_or_else(|| ReconError::MissingColumn {
            dataset: dataset.to_string(),
            column: synonyms
                .first()
                .map(|s| s.as_ref().to_string())
                .unwrap_or_default(),
        })
    }

    /// Header → value map for one data row. Unnamed columns are keyed by letter.
    pub fn record(&self, row: &RawRow) -> BTreeMap<String, String> {
        let width = self.headers.len().max(row.len());
        (0..width)
            .filter_map(|col| {
                let value = row.get(col).text()?;
                let key = match self.headers.get(col) {
                    Some(h) if !h.is_empty() => h.clone(),
                    _ => column_letter(col),
                };
                Some((key, value))
            })
            .collect()
    }
}
