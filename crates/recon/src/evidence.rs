use std::collections::BTreeMap;

use crate::aggregate::{percentage, AggregateRow};
use crate::compare::{ComparisonOutcome, ComparisonResult};
use crate::model::{ComparisonSummary, OccurrenceSummary, RouteSummary};
use crate::occurrence::OccurrenceRow;
use crate::route_sheet::RouteSheet;
use crate::status::StatusBook;

/// Totals over the aggregate rows actually reported.
pub fn compute_route_summary(rows: &[AggregateRow], sheet: &RouteSheet, book: &StatusBook) -> RouteSummary {
    let mut total_orders = 0;
    let mut delivered = 0;
    let mut unsuccessful = 0;
    let mut pending = 0;
    let mut routes_by_region: BTreeMap<String, usize> = BTreeMap::new();

    for r in rows {
        total_orders += r.delivery.total_orders;
        delivered += r.delivery.delivered;
        unsuccessful += r.delivery.unsuccessful;
        pending += r.delivery.pending;
        *routes_by_region.entry(r.region.label().to_string()).or_insert(0) += 1;
    }

    let mut drivers: Vec<&str> = rows.iter().map(|r| r.driver_name.as_str()).collect();
    drivers.sort_unstable();
    drivers.dedup();

    let codes_with_status = sheet
        .routes()
        .flat_map(|(_, route)| route.order_codes.iter())
        .filter(|code| book.get(code).is_some())
        .collect::<std::collections::HashSet<_>>()
        .len();

    RouteSummary {
        drivers: drivers.len(),
        routes: rows.len(),
        total_orders,
        delivered,
        unsuccessful,
        pending,
        delivery_pct: percentage(delivered, total_orders),
        route_pct: percentage(total_orders - pending, total_orders),
        codes_with_status,
        routes_by_region,
    }
}

pub fn compute_comparison_summary(results: &[ComparisonResult]) -> ComparisonSummary {
    let mut matched = 0;
    let mut only_in_secondary = 0;
    let mut only_in_primary = 0;

    for r in results {
        match r.outcome {
            ComparisonOutcome::Matched => matched += 1,
            ComparisonOutcome::OnlyInSecondarySource => only_in_secondary += 1,
            ComparisonOutcome::OnlyInPrimarySource => only_in_primary += 1,
        }
    }

    ComparisonSummary {
        total: results.len(),
        matched,
        only_in_secondary,
        only_in_primary,
    }
}

pub fn compute_occurrence_summary(input_rows: usize, rows: &[OccurrenceRow]) -> OccurrenceSummary {
    let mut by_occurrence: BTreeMap<String, usize> = BTreeMap::new();
    for r in rows {
        *by_occurrence.entry(r.occurrence.label().to_string()).or_insert(0) += 1;
    }
    OccurrenceSummary {
        input_rows,
        kept: rows.len(),
        by_occurrence,
    }
}
