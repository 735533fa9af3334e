//! Pipeline entry points. Each call runs one pipeline to completion and
//! returns a report envelope (meta + summary + rows).

use crate::aggregate::reconcile;
use crate::compare::SetComparator;
use crate::config::ReconConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::ReconError;
use crate::evidence::{compute_comparison_summary, compute_occurrence_summary, compute_route_summary};
use crate::grid::{Grid, HeaderTable};
use crate::model::{ComparisonReport, LatestReport, OccurrenceReport, ReportMeta, RouteReport};
use crate::occurrence::filter_occurrences;
use crate::region::RegionFilter;
use crate::route_sheet::RouteSheetExtractor;
use crate::status::{events_from_table, latest_entries, StatusBook};

/// Counts diagnostics on their way to the caller's sink.
struct Counting<'a> {
    inner: &'a mut dyn DiagnosticSink,
    count: usize,
}

impl DiagnosticSink for Counting<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.count += 1;
        self.inner.emit(diagnostic);
    }
}

/// Route manifest → per-route delivery aggregates. Without a status export
/// every code stays pending.
pub fn run_routes(
    config: &ReconConfig,
    manifest: &Grid,
    status: Option<&Grid>,
    filter: RegionFilter,
    sink: &mut dyn DiagnosticSink,
) -> Result<RouteReport, ReconError> {
    let mut sink = Counting { inner: sink, count: 0 };

    let sheet = RouteSheetExtractor::new(config).extract(manifest, &mut sink);
    let book = match status {
        Some(grid) => {
            let table = HeaderTable::from_grid(grid, 0);
            let events = events_from_table(&table, config, &mut sink)?;
            StatusBook::resolve(&events, &mut sink)
        }
        None => StatusBook::default(),
    };

    let rows = reconcile(&sheet, &book, filter);
    let summary = compute_route_summary(&rows, &sheet, &book);

    tracing::info!(
        routes = summary.routes,
        delivered = summary.delivered,
        total_orders = summary.total_orders,
        "route reconciliation finished"
    );

    Ok(RouteReport {
        meta: ReportMeta::new("routes", sink.count),
        region_filter: filter.to_string(),
        summary,
        rows,
    })
}

/// Cross-check order numbers of one or two primary exports against a
/// secondary export.
pub fn run_compare(config: &ReconConfig, primaries: &[&Grid], secondary: &Grid) -> Result<ComparisonReport, ReconError> {
    let comparator = SetComparator::new(config.compare.primary_skip_rows, config.compare.secondary_skip_rows);
    let comparison = comparator.run(primaries, secondary)?;
    let summary = compute_comparison_summary(&comparison.results);

    tracing::info!(
        matched = summary.matched,
        only_in_primary = summary.only_in_primary,
        only_in_secondary = summary.only_in_secondary,
        "order comparison finished"
    );

    Ok(ComparisonReport {
        meta: ReportMeta::new("compare", 0),
        primary_orders: comparison.primary.len(),
        secondary_orders: comparison.secondary.len(),
        summary,
        results: comparison.results,
    })
}

/// Filter an occurrence export down to valid, de-duplicated rows.
pub fn run_occurrences(
    config: &ReconConfig,
    grid: &Grid,
    sink: &mut dyn DiagnosticSink,
) -> Result<OccurrenceReport, ReconError> {
    let mut sink = Counting { inner: sink, count: 0 };
    let table = HeaderTable::from_grid(grid, 0);
    let rows = filter_occurrences(&table, config, &mut sink)?;
    let summary = compute_occurrence_summary(table.rows().len(), &rows);

    tracing::info!(input_rows = summary.input_rows, kept = summary.kept, "occurrence filter finished");

    Ok(OccurrenceReport {
        meta: ReportMeta::new("occurrences", sink.count),
        summary,
        rows,
    })
}

/// Keep the most recent status row per code.
pub fn run_latest(config: &ReconConfig, grid: &Grid) -> Result<LatestReport, ReconError> {
    let table = HeaderTable::from_grid(grid, 0);
    let entries = latest_entries(&table, config)?;
    Ok(LatestReport {
        meta: ReportMeta::new("latest", 0),
        input_rows: table.rows().len(),
        entries,
    })
}
