//! `romaneio-recon`: delivery reconciliation over decoded spreadsheet grids.
//!
//! Pure engine crate: receives already-decoded grids, returns reports.
//! No CLI or file-format dependencies.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod datetime;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod grid;
pub mod model;
pub mod occurrence;
pub mod region;
pub mod route_sheet;
pub mod status;
pub mod text;

pub use config::ReconConfig;
pub use diagnostics::{Collector, Diagnostic, DiagnosticSink, NullSink, TracingSink};
pub use engine::{run_compare, run_latest, run_occurrences, run_routes};
pub use error::ReconError;
pub use grid::{Cell, Grid, HeaderTable, RawRow};
pub use model::{ComparisonReport, LatestReport, OccurrenceReport, RouteReport};
pub use region::{Region, RegionFilter};
