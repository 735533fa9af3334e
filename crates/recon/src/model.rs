use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::AggregateRow;
use crate::compare::ComparisonResult;
use crate::occurrence::OccurrenceRow;
use crate::status::LatestEntry;

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub pipeline: String,
    pub engine_version: String,
    pub run_at: String,
    /// Number of diagnostics emitted while the report was built.
    pub diagnostics: usize,
}

impl ReportMeta {
    pub fn new(pipeline: &str, diagnostics: usize) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub drivers: usize,
    pub routes: usize,
    pub total_orders: i64,
    pub delivered: i64,
    pub unsuccessful: i64,
    pub pending: i64,
    pub delivery_pct: i64,
    pub route_pct: i64,
    /// Distinct codes with a resolved status.
    pub codes_with_status: usize,
    /// Routes per region label.
    pub routes_by_region: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub meta: ReportMeta,
    pub region_filter: String,
    pub summary: RouteSummary,
    pub rows: Vec<AggregateRow>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub matched: usize,
    pub only_in_secondary: usize,
    pub only_in_primary: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub meta: ReportMeta,
    pub primary_orders: usize,
    pub secondary_orders: usize,
    pub summary: ComparisonSummary,
    pub results: Vec<ComparisonResult>,
}

impl ComparisonReport {
    pub fn has_unmatched(&self) -> bool {
        self.summary.only_in_primary > 0 || self.summary.only_in_secondary > 0
    }
}

// ---------------------------------------------------------------------------
// Occurrences + latest entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceSummary {
    pub input_rows: usize,
    pub kept: usize,
    /// Kept rows per canonical label.
    pub by_occurrence: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OccurrenceReport {
    pub meta: ReportMeta,
    pub summary: OccurrenceSummary,
    pub rows: Vec<OccurrenceRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestReport {
    pub meta: ReportMeta,
    pub input_rows: usize,
    pub entries: Vec<LatestEntry>,
}
