use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::region::{Region, RegionFilter};
use crate::route_sheet::{Route, RouteSheet};
use crate::status::{DeliveryOutcome, StatusBook};

/// Delivery figures for one route, derived from its order codes and the
/// resolved statuses. Always recomputed from scratch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryAggregate {
    pub total_orders: i64,
    pub delivered: i64,
    /// `total_orders - delivered - unsuccessful`; negative when a route lists
    /// more codes than it declares.
    pub pending: i64,
    pub unsuccessful: i64,
    pub delivery_pct: i64,
    pub route_pct: i64,
    pub successful_codes: Vec<String>,
    pub unsuccessful_codes: Vec<String>,
    pub sender_by_code: BTreeMap<String, String>,
}

/// `round(100 * num / den)` with halves rounded up; 0 when `den` is not positive.
pub fn percentage(num: i64, den: i64) -> i64 {
    if den <= 0 {
        return 0;
    }
    (200 * num + den).div_euclid(2 * den)
}

fn push_unique(list: &mut Vec<String>, seen: &mut HashSet<String>, code: &str) {
    if seen.insert(code.to_string()) {
        list.push(code.to_string());
    }
}

pub fn compute(route: &Route, book: &StatusBook) -> DeliveryAggregate {
    let mut delivered = 0;
    let mut unsuccessful = 0;
    let mut successful_codes = Vec::new();
    let mut unsuccessful_codes = Vec::new();
    let mut seen_ok = HashSet::new();
    let mut seen_fail = HashSet::new();
    let mut sender_by_code = BTreeMap::new();

    for code in &route.order_codes {
        let Some(record) = book.get(code) else {
            continue;
        };
        sender_by_code.insert(code.clone(), record.sender.clone());
        match record.outcome {
            DeliveryOutcome::Delivered => {
                delivered += 1;
                push_unique(&mut successful_codes, &mut seen_ok, code);
            }
            DeliveryOutcome::Unsuccessful => {
                unsuccessful += 1;
                push_unique(&mut unsuccessful_codes, &mut seen_fail, code);
            }
            DeliveryOutcome::Uncounted => {}
        }
    }

    let total = route.total_orders;
    let pending = total - delivered - unsuccessful;
    DeliveryAggregate {
        total_orders: total,
        delivered,
        pending,
        unsuccessful,
        delivery_pct: percentage(delivered, total),
        route_pct: percentage(total - pending, total),
        successful_codes,
        unsuccessful_codes,
        sender_by_code,
    }
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub driver_name: String,
    pub route_index: usize,
    /// Routes the driver has in the sheet.
    pub route_count: usize,
    pub region: Region,
    pub vehicle: String,
    pub origin: String,
    pub service_codes: Vec<String>,
    #[serde(flatten)]
    pub delivery: DeliveryAggregate,
}

/// One row per route, sorted by delivery percentage ascending (stable).
pub fn reconcile(sheet: &RouteSheet, book: &StatusBook, filter: RegionFilter) -> Vec<AggregateRow> {
    let mut rows: Vec<AggregateRow> = sheet
        .routes()
        .filter(|(_, route)| filter.admits(route.region))
        .map(|(driver, route)| AggregateRow {
            driver_name: driver.name.clone(),
            route_index: route.index,
            route_count: driver.routes.len(),
            region: route.region,
            vehicle: route.vehicle.clone(),
            origin: route.origin.clone(),
            service_codes: route.order_codes.clone(),
            delivery: compute(route, book),
        })
        .collect();
    rows.sort_by_key(|r| r.delivery.delivery_pct);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::route_sheet::Driver;
    use crate::status::StatusEvent;
    use chrono::NaiveDate;

    fn event(code: &str, status: &str, hour: u32, sender: &str) -> StatusEvent {
        StatusEvent {
            code: code.into(),
            status: status.to_lowercase(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(hour, 0, 0).unwrap(),
            raw_timestamp: String::new(),
            sender: sender.into(),
            agent: "x".into(),
            title: None,
        }
    }

    fn route(total: i64, codes: &[&str], region: Region) -> Route {
        Route {
            index: 1,
            total_orders: total,
            vehicle: String::new(),
            origin: String::new(),
            region,
            order_codes: codes.iter().map(|c| c.to_string()).collect(),
            titles: vec![String::new(); codes.len()],
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(7, 0), 0);
    }

    #[test]
    fn counts_and_percentages() {
        let book = StatusBook::resolve(
            &[
                event("a", "Sucesso", 9, "Loja 1"),
                event("b", "Sem sucesso", 9, "Loja 2"),
                event("c", "Em rota", 9, "Loja 3"),
            ],
            &mut NullSink,
        );
        let agg = compute(&route(4, &["a", "b", "c", "zz"], Region::Dafiti), &book);
        assert_eq!(agg.delivered, 1);
        assert_eq!(agg.unsuccessful, 1);
        assert_eq!(agg.pending, 2);
        assert_eq!(agg.delivery_pct, 25);
        assert_eq!(agg.route_pct, 50);
        assert_eq!(agg.successful_codes, vec!["a"]);
        assert_eq!(agg.unsuccessful_codes, vec!["b"]);
        assert_eq!(agg.sender_by_code.len(), 3);
        assert_eq!(agg.sender_by_code["c"], "Loja 3");
    }

    #[test]
    fn zero_total_never_divides() {
        let book = StatusBook::resolve(&[event("a", "Sucesso", 9, "")], &mut NullSink);
        let agg = compute(&route(0, &["a"], Region::Dafiti), &book);
        assert_eq!(agg.delivery_pct, 0);
        assert_eq!(agg.route_pct, 0);
        assert_eq!(agg.pending, -1);
    }

    #[test]
    fn pending_may_go_negative() {
        let book = StatusBook::resolve(
            &[event("a", "sucesso", 1, ""), event("b", "sucesso", 1, ""), event("c", "sucesso", 1, "")],
            &mut NullSink,
        );
        let agg = compute(&route(2, &["a", "b", "c"], Region::Dafiti), &book);
        assert_eq!(agg.pending, -1);
        assert_eq!(agg.delivery_pct, 150);
    }

    #[test]
    fn rows_sorted_by_delivery_and_filtered_by_region() {
        let sheet = RouteSheet {
            drivers: vec![
                Driver { name: "Full".into(), routes: vec![route(1, &["a"], Region::SaoPaulo)] },
                Driver {
                    name: "Empty".into(),
                    routes: vec![route(2, &["x"], Region::SaoPaulo), route(1, &["a"], Region::Nespresso)],
                },
            ],
        };
        let book = StatusBook::resolve(&[event("a", "sucesso", 1, "")], &mut NullSink);

        let rows = reconcile(&sheet, &book, RegionFilter::All);
        let order: Vec<_> = rows.iter().map(|r| (r.driver_name.as_str(), r.delivery.delivery_pct)).collect();
        assert_eq!(order, vec![("Empty", 0), ("Full", 100), ("Empty", 100)]);
        assert_eq!(rows[0].route_count, 2);

        let sp = reconcile(&sheet, &book, RegionFilter::Only(Region::SaoPaulo));
        assert_eq!(sp.len(), 2);
        assert!(sp.iter().all(|r| r.region == Region::SaoPaulo));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let sheet = RouteSheet {
            drivers: vec![Driver { name: "D".into(), routes: vec![route(3, &["a", "b"], Region::Dafiti)] }],
        };
        let events = [event("a", "sucesso", 1, "s"), event("b", "sem sucesso", 2, "t")];
        let first = reconcile(&sheet, &StatusBook::resolve(&events, &mut NullSink), RegionFilter::All);
        let second = reconcile(&sheet, &StatusBook::resolve(&events, &mut NullSink), RegionFilter::All);
        assert_eq!(first, second);
    }
}
