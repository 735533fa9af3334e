//! `romaneio routes`: delivery figures per route.

use std::path::Path;

use romaneio_recon::aggregate::AggregateRow;
use romaneio_recon::{run_routes, RegionFilter, TracingSink};

use crate::export::{self, OutputArgs};
use crate::{load_config, load_grid, CliError};

const CSV_HEADER: [&str; 15] = [
    "driver_name",
    "route_index",
    "route_count",
    "region",
    "vehicle",
    "origin",
    "total_orders",
    "delivered",
    "unsuccessful",
    "pending",
    "delivery_pct",
    "route_pct",
    "service_codes",
    "successful_codes",
    "unsuccessful_codes",
];

pub fn cmd_routes(
    config_path: Option<&Path>,
    manifest: &Path,
    status: Option<&Path>,
    region: RegionFilter,
    output: &OutputArgs,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let manifest_grid = load_grid(manifest)?;
    let status_grid = status.map(load_grid).transpose()?;
    if status_grid.is_none() {
        tracing::info!("no status export given, every order counts as pending");
    }

    let report = run_routes(&config, &manifest_grid, status_grid.as_ref(), region, &mut TracingSink)
        .map_err(CliError::recon)?;

    export::write_report(&report, output)?;
    if let Some(ref path) = output.csv {
        export::write_csv(path, &csv_rows(&report.rows))?;
    }
    if !output.json {
        print_rows(&report.rows);
    }

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "{} routes from {} drivers ({}): {}/{} delivered ({}%), {} unsuccessful, {} pending",
        s.routes,
        s.drivers,
        report.region_filter,
        s.delivered,
        s.total_orders,
        s.delivery_pct,
        s.unsuccessful,
        s.pending,
    );
    if report.meta.diagnostics > 0 {
        eprintln!("{} rows reported diagnostics (RUST_LOG=debug shows them)", report.meta.diagnostics);
    }
    Ok(())
}

fn csv_rows(rows: &[AggregateRow]) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(CSV_HEADER.iter().map(|h| h.to_string()).collect());
    for row in rows {
        let d = &row.delivery;
        out.push(vec![
            row.driver_name.clone(),
            row.route_index.to_string(),
            row.route_count.to_string(),
            row.region.label().to_string(),
            row.vehicle.clone(),
            row.origin.clone(),
            d.total_orders.to_string(),
            d.delivered.to_string(),
            d.unsuccessful.to_string(),
            d.pending.to_string(),
            d.delivery_pct.to_string(),
            d.route_pct.to_string(),
            row.service_codes.join(" "),
            d.successful_codes.join(" "),
            d.unsuccessful_codes.join(" "),
        ]);
    }
    out
}

fn print_rows(rows: &[AggregateRow]) {
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let d = &row.delivery;
            vec![
                row.driver_name.clone(),
                format!("{}/{}", row.route_index, row.route_count),
                row.region.label().to_string(),
                format!("{}/{}", d.delivered, d.total_orders),
                d.unsuccessful.to_string(),
                d.pending.to_string(),
                format!("{}%", d.delivery_pct),
                format!("{}%", d.route_pct),
            ]
        })
        .collect();
    export::print_table(
        &["DRIVER", "ROUTE", "REGION", "DELIVERED", "FAILED", "PENDING", "DELIVERY", "COVERED"],
        &table,
    );
}
