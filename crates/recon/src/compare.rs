//! Order-number cross-check between one or two primary exports and a
//! secondary export.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::ReconError;
use crate::grid::{Cell, Grid, COL_A};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Matched,
    OnlyInSecondarySource,
    OnlyInPrimarySource,
}

impl ComparisonOutcome {
    pub const ALL: [ComparisonOutcome; 3] = [
        ComparisonOutcome::Matched,
        ComparisonOutcome::OnlyInSecondarySource,
        ComparisonOutcome::OnlyInPrimarySource,
    ];

    /// Label used by operations staff in exported sheets.
    pub fn label(self) -> &'static str {
        match self {
            ComparisonOutcome::Matched => "Recebido",
            ComparisonOutcome::OnlyInSecondarySource => "Não recebido na base",
            ComparisonOutcome::OnlyInPrimarySource => {
                "Pedido recebido, mas não enviado no arquivo da Riachuelo"
            }
        }
    }
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub order_number: String,
    pub outcome: ComparisonOutcome,
}

// ---------------------------------------------------------------------------
// Order-number sets
// ---------------------------------------------------------------------------

/// Insertion-ordered set of order numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSet {
    values: Vec<String>,
    seen: HashSet<String>,
}

impl OrderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: &str) -> bool {
        if self.seen.insert(value.to_string()) {
            self.values.push(value.to_string());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Append every value of `other` not already present.
    pub fn merge(&mut self, other: &OrderSet) {
        for v in other.iter() {
            self.insert(v);
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for OrderSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = OrderSet::new();
        for v in iter {
            set.insert(v.as_ref());
        }
        set
    }
}

/// Looks like an order number once spaces, dashes and parentheses are
/// removed: what remains is non-empty and parses as a finite number.
pub fn is_numeric_like(text: &str) -> bool {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    !stripped.is_empty() && stripped.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false)
}

/// Column-A values that look like order numbers, after `skip` leading rows.
pub fn collect_order_numbers(grid: &Grid, skip: usize) -> OrderSet {
    let mut set = OrderSet::new();
    for row in grid.rows().iter().skip(skip) {
        match row.get(COL_A) {
            Cell::Number(n) if n.is_finite() => {
                set.insert(&Cell::Number(*n).to_text());
            }
            Cell::Text(s) => {
                let value = s.trim();
                if is_numeric_like(value) {
                    set.insert(value);
                }
            }
            _ => {}
        }
    }
    set
}

/// Matched, then secondary-only, then primary-only; insertion order within
/// each group.
pub fn compare_sets(primary: &OrderSet, secondary: &OrderSet) -> Vec<ComparisonResult> {
    let result = |v: &str, outcome| ComparisonResult { order_number: v.to_string(), outcome };

    let matched = primary
        .iter()
        .filter(|v| secondary.contains(v))
        .map(|v| result(v, ComparisonOutcome::Matched));
    let only_secondary = secondary
        .iter()
        .filter(|v| !primary.contains(v))
        .map(|v| result(v, ComparisonOutcome::OnlyInSecondarySource));
    let only_primary = primary
        .iter()
        .filter(|v| !secondary.contains(v))
        .map(|v| result(v, ComparisonOutcome::OnlyInPrimarySource));

    matched.chain(only_secondary).chain(only_primary).collect()
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// The coalesced order sets and their comparison.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub primary: OrderSet,
    pub secondary: OrderSet,
    pub results: Vec<ComparisonResult>,
}

/// Compares one or two primary exports against a secondary export.
#[derive(Debug, Clone, Copy)]
pub struct SetComparator {
    pub primary_skip_rows: usize,
    pub secondary_skip_rows: usize,
}

impl SetComparator {
    pub fn new(primary_skip_rows: usize, secondary_skip_rows: usize) -> Self {
        Self { primary_skip_rows, secondary_skip_rows }
    }

    pub fn compare(&self, primaries: &[&Grid], secondary: &Grid) -> Result<Vec<ComparisonResult>, ReconError> {
        self.run(primaries, secondary).map(|c| c.results)
    }

    /// Like [`compare`](Self::compare), keeping the sets it built.
    pub fn run(&self, primaries: &[&Grid], secondary: &Grid) -> Result<Comparison, ReconError> {
        if primaries.is_empty() {
            return Err(ReconError::EmptyDataset("at least one primary export is required".into()));
        }

        let mut primary = OrderSet::new();
        for grid in primaries {
            primary.merge(&collect_order_numbers(grid, self.primary_skip_rows));
        }
        let secondary = collect_order_numbers(secondary, self.secondary_skip_rows);

        tracing::debug!(
            primaries = primaries.len(),
            primary_orders = primary.len(),
            secondary_orders = secondary.len(),
            "comparing order numbers"
        );
        let results = compare_sets(&primary, &secondary);
        Ok(Comparison { primary, secondary, results })
    }
}
