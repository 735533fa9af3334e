//! Route manifest parser.
//!
//! The manifest is a header-less grid where column A carries marker tokens
//! (`Agente:`, `Serviços:`, `Veículo:`, `Início:`) with their value in column
//! B, and order-code rows carry codes in columns G/H. Rows are read strictly in
//! order with a single open route; a driver marker closes it and opens the
//! next one.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::ReconConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, SkipReason};
use crate::error::ReconError;
use crate::grid::{Grid, RawRow, COL_A, COL_B, COL_G, COL_H};
use crate::region::{self, Region};
use crate::text::leading_int;

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// 1-based position among the driver's routes.
    pub index: usize,
    pub total_orders: i64,
    pub vehicle: String,
    pub origin: String,
    pub region: Region,
    pub order_codes: Vec<String>,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub name: String,
    pub routes: Vec<Route>,
}

/// Drivers in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSheet {
    pub drivers: Vec<Driver>,
}

impl RouteSheet {
    pub fn route_count(&self) -> usize {
        self.drivers.iter().map(|d| d.routes.len()).sum()
    }

    pub fn driver(&self, name: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.name == name)
    }

    /// Every route paired with its driver, in tree order.
    pub fn routes(&self) -> impl Iterator<Item = (&Driver, &Route)> {
        self.drivers.iter().flat_map(|d| d.routes.iter().map(move |r| (d, r)))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RouteDraft {
    total_orders: i64,
    vehicle: String,
    origin: String,
    order_codes: Vec<String>,
    titles: Vec<String>,
}

struct DriverSlot {
    name: String,
    is_broker: bool,
    routes: Vec<Route>,
}

struct OpenRoute {
    driver: usize,
    draft: RouteDraft,
}

/// Owns per-driver state by index; a route is finalized (region computed,
/// moved into its driver) when the next driver marker arrives or input ends.
struct SheetBuilder {
    drivers: Vec<DriverSlot>,
    by_name: HashMap<String, usize>,
    open: Option<OpenRoute>,
}

impl SheetBuilder {
    fn new() -> Self {
        Self { drivers: Vec::new(), by_name: HashMap::new(), open: None }
    }

    fn open_route(&mut self, name: &str, is_broker: bool) {
        self.close_route();
        let driver = match self.by_name.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.drivers.len();
                self.drivers.push(DriverSlot { name: name.to_string(), is_broker, routes: Vec::new() });
                self.by_name.insert(name.to_string(), idx);
                idx
            }
        };
        self.open = Some(OpenRoute { driver, draft: RouteDraft::default() });
    }

    fn draft(&mut self) -> Option<&mut RouteDraft> {
        self.open.as_mut().map(|o| &mut o.draft)
    }

    fn open_driver_is_broker(&self) -> Option<bool> {
        self.open.as_ref().map(|o| self.drivers[o.driver].is_broker)
    }

    fn close_route(&mut self) {
        let Some(OpenRoute { driver, draft }) = self.open.take() else {
            return;
        };
        let slot = &mut self.drivers[driver];
        let region = region::classify(slot.is_broker, &draft.vehicle, &draft.origin);
        slot.routes.push(Route {
            index: slot.routes.len() + 1,
            total_orders: draft.total_orders,
            vehicle: draft.vehicle,
            origin: draft.origin,
            region,
            order_codes: draft.order_codes,
            titles: draft.titles,
        });
    }

    fn finish(mut self) -> RouteSheet {
        self.close_route();
        RouteSheet {
            drivers: self
                .drivers
                .into_iter()
                .map(|s| Driver { name: s.name, routes: s.routes })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

enum RowKind {
    Driver(String),
    OrderCount(String),
    Vehicle(String),
    Origin(String),
    Code,
    Other,
}

fn skipped(sink: &mut dyn DiagnosticSink, row: usize, reason: SkipReason) {
    sink.emit(Diagnostic::RowSkipped { row, reason });
}

pub struct RouteSheetExtractor<'a> {
    config: &'a ReconConfig,
}

impl<'a> RouteSheetExtractor<'a> {
    pub fn new(config: &'a ReconConfig) -> Self {
        Self { config }
    }

    fn kind(&self, row: &RawRow) -> RowKind {
        let marker = row.get(COL_A).to_text();
        let value = row.text(COL_B);
        let tokens = &self.config.markers;

        match value {
            Some(v) if marker.contains(tokens.driver.as_str()) && !v.trim().is_empty() => {
                return RowKind::Driver(v.trim().to_string())
            }
            Some(v) if marker.contains(tokens.order_count.as_str()) => return RowKind::OrderCount(v),
            Some(v) if marker.contains(tokens.vehicle.as_str()) => return RowKind::Vehicle(v),
            Some(v) if marker.contains(tokens.origin.as_str()) => return RowKind::Origin(v),
            _ => {}
        }

        if row.get(COL_G).is_present() || row.get(COL_H).is_present() {
            RowKind::Code
        } else {
            RowKind::Other
        }
    }

    pub fn extract(&self, grid: &Grid, sink: &mut dyn DiagnosticSink) -> RouteSheet {
        let mut builder = SheetBuilder::new();

        for (row_idx, row) in grid.rows().iter().enumerate() {
            match self.kind(row) {
                RowKind::Driver(name) => {
                    let is_broker = self.config.is_broker(&name);
                    builder.open_route(&name, is_broker);
                }
                RowKind::OrderCount(v) => match builder.draft() {
                    Some(draft) => draft.total_orders = leading_int(&v).unwrap_or(0),
                    None => skipped(sink, row_idx, SkipReason::NoOpenRoute),
                },
                RowKind::Vehicle(v) => match builder.draft() {
                    Some(draft) => draft.vehicle = v,
                    None => skipped(sink, row_idx, SkipReason::NoOpenRoute),
                },
                RowKind::Origin(v) => match builder.draft() {
                    Some(draft) => draft.origin = v,
                    None => skipped(sink, row_idx, SkipReason::NoOpenRoute),
                },
                RowKind::Code => {
                    let Some(is_broker) = builder.open_driver_is_broker() else {
                        skipped(sink, row_idx, SkipReason::NoOpenRoute);
                        continue;
                    };
                    let g = row.text(COL_G).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
                    let h = row.text(COL_H).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
                    let entry = match (is_broker, g, h) {
                        (true, _, Some(h)) => Some((h.clone(), h)),
                        (_, Some(g), h) => Some((g, h.unwrap_or_default())),
                        _ => None,
                    };
                    match (entry, builder.draft()) {
                        (Some((code, title)), Some(draft)) => {
                            draft.order_codes.push(code);
                            draft.titles.push(title);
                        }
                        _ => skipped(sink, row_idx, SkipReason::MissingOrderCode),
                    }
                }
                RowKind::Other => {}
            }
        }

        let sheet = builder.finish();
        tracing::debug!(
            drivers = sheet.drivers.len(),
            routes = sheet.route_count(),
            rows = grid.len(),
            "route sheet extracted"
        );
        sheet
    }

    /// Parse a JSON grid (array of arrays or array of letter-keyed objects).
    pub fn extract_json(&self, value: &Value, sink: &mut dyn DiagnosticSink) -> Result<RouteSheet, ReconError> {
        let grid = Grid::from_json(value)?;
        Ok(self.extract(&grid, sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Collector;
    use serde_json::json;

    fn row(a: &str, b: &str, g: &str, h: &str) -> Vec<String> {
        let mut cells = vec![String::new(); 8];
        cells[0] = a.into();
        cells[1] = b.into();
        cells[6] = g.into();
        cells[7] = h.into();
        cells
    }

    fn extract(rows: &[Vec<String>]) -> (RouteSheet, Collector) {
        let config = ReconConfig::default();
        let mut sink = Collector::new();
        let sheet = RouteSheetExtractor::new(&config).extract(&Grid::from_rows(rows), &mut sink);
        (sheet, sink)
    }

    #[test]
    fn single_route_with_markers_and_codes() {
        let (sheet, sink) = extract(&[
            row("Agente:", "Maria Souza", "", ""),
            row("Serviços:", "3", "", ""),
            row("Veículo:", "VAN SP 01", "", ""),
            row("Início:", "CD Pari", "", ""),
            row("", "", "111", "Pedido A"),
            row("", "", "222", ""),
        ]);
        assert!(sink.is_empty());
        assert_eq!(sheet.drivers.len(), 1);
        let route = &sheet.drivers[0].routes[0];
        assert_eq!(route.index, 1);
        assert_eq!(route.total_orders, 3);
        assert_eq!(route.vehicle, "VAN SP 01");
        assert_eq!(route.region, Region::SaoPaulo);
        assert_eq!(route.order_codes, vec!["111", "222"]);
        assert_eq!(route.titles, vec!["Pedido A", ""]);
    }

    #[test]
    fn repeated_driver_gets_a_second_route() {
        let (sheet, _) = extract(&[
            row("Agente:", "Ana", "", ""),
            row("", "", "1", ""),
            row("Agente:", "Bruno", "", ""),
            row("", "", "2", ""),
            row("Agente:", "Ana", "", ""),
            row("Veículo:", "RJ 10", "", ""),
            row("", "", "3", ""),
        ]);
        let names: Vec<_> = sheet.drivers.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Bruno"]);
        let ana = sheet.driver("Ana").unwrap();
        assert_eq!(ana.routes.len(), 2);
        assert_eq!(ana.routes[1].index, 2);
        assert_eq!(ana.routes[1].order_codes, vec!["3"]);
        assert_eq!(ana.routes[1].region, Region::RioDeJaneiro);
        assert_eq!(sheet.route_count(), 3);
    }

    #[test]
    fn region_uses_values_set_after_the_driver_marker() {
        let (sheet, _) = extract(&[
            row("Agente:", "Carla", "", ""),
            row("Início:", "Nespresso Barueri", "", ""),
        ]);
        assert_eq!(sheet.drivers[0].routes[0].region, Region::Nespresso);
    }

    #[test]
    fn broker_codes_come_from_column_h() {
        let (sheet, sink) = extract(&[
            row("Agente:", "Joao Batista Carneiro", "", ""),
            row("", "", "999", "ABC-123"),
            row("", "", "888", ""),
        ]);
        let route = &sheet.drivers[0].routes[0];
        assert_eq!(route.order_codes, vec!["ABC-123", "888"]);
        assert_eq!(route.titles, vec!["ABC-123", ""]);
        assert_eq!(route.region, Region::Dafiti);
        assert!(sink.is_empty());
    }

    #[test]
    fn regular_driver_without_column_g_is_skipped() {
        let (sheet, sink) = extract(&[
            row("Agente:", "Ana", "", ""),
            row("", "", "", "only a title"),
        ]);
        assert!(sheet.drivers[0].routes[0].order_codes.is_empty());
        assert_eq!(
            sink.diagnostics,
            vec![Diagnostic::RowSkipped { row: 1, reason: SkipReason::MissingOrderCode }]
        );
    }

    #[test]
    fn rows_before_any_driver_are_skipped() {
        let (sheet, sink) = extract(&[
            row("Relatório de rotas", "", "", ""),
            row("Serviços:", "10", "", ""),
            row("", "", "555", ""),
            row("Agente:", "Ana", "", ""),
        ]);
        assert_eq!(sheet.route_count(), 1);
        assert_eq!(sheet.drivers[0].routes[0].total_orders, 0);
        assert_eq!(sink.count(|d| matches!(d, Diagnostic::RowSkipped { reason: SkipReason::NoOpenRoute, .. })), 2);
    }

    #[test]
    fn non_numeric_count_defaults_to_zero() {
        let (sheet, _) = extract(&[row("Agente:", "Ana", "", ""), row("Serviços:", "muitos", "", "")]);
        assert_eq!(sheet.drivers[0].routes[0].total_orders, 0);
    }

    #[test]
    fn driver_marker_without_name_is_ignored() {
        let (sheet, _) = extract(&[
            row("Agente:", "Ana", "", ""),
            row("Agente:", "", "", ""),
            row("", "", "7", ""),
        ]);
        assert_eq!(sheet.route_count(), 1);
        assert_eq!(sheet.drivers[0].routes[0].order_codes, vec!["7"]);
    }

    #[test]
    fn json_objects_keyed_by_letter() {
        let config = ReconConfig::default();
        let value = json!([
            { "A": "Agente:", "B": "Ana" },
            { "A": "Serviços:", "B": 2 },
            { "G": 12345, "H": "x" },
        ]);
        let sheet = RouteSheetExtractor::new(&config)
            .extract_json(&value, &mut Collector::new())
            .unwrap();
        let route = &sheet.drivers[0].routes[0];
        assert_eq!(route.total_orders, 2);
        assert_eq!(route.order_codes, vec!["12345"]);
    }

    #[test]
    fn json_that_is_not_a_grid_fails() {
        let config = ReconConfig::default();
        let err = RouteSheetExtractor::new(&config)
            .extract_json(&json!({ "rows": 3 }), &mut Collector::new())
            .unwrap_err();
        assert!(matches!(err, ReconError::NotAGrid(_)));
    }
}
