//! Batch driver for master dataset construction.
//!
//! Usage:
//!   masterset <fact_sales.csv> <fact_purchases.csv> <fact_inventory_snapshot.csv> [out.csv]
//!
//! Loads the three fact extracts, runs the pipeline, writes the enriched
//! table as CSV (absent derived fields stay empty cells) and prints a JSON
//! run summary to stdout. Exit codes: 0 success, 1 validation failure,
//! 2 load/data-shape error.

use std::env;
use std::process;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use masterset_pipeline::fact_loader::{
    load_purchases_file, load_sales_file, load_snapshots_file,
};
use masterset_pipeline::{
    EnrichedTransaction, MasterDatasetPipeline, PipelineError, ValidationReport,
};

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunSummaryJson {
    generated_at: String,
    sales_rows: usize,
    purchase_rows: usize,
    snapshot_rows: usize,
    output_rows: usize,
    products_with_cost: usize,
    snapshot_groups: usize,
    cost_coverage_pct: f64,
    inventory_coverage_pct: f64,
    pipeline_ms: u128,
    output_file: String,
    report: ValidationReport,
}

const DEFAULT_OUTPUT: &str = "Master_Dataset.csv";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        eprintln!(
            "usage: {} <fact_sales.csv> <fact_purchases.csv> <fact_inventory_snapshot.csv> [out.csv]",
            args[0]
        );
        process::exit(2);
    }
    let output_path = args.get(4).map(String::as_str).unwrap_or(DEFAULT_OUTPUT);

    let sales = load_or_exit(load_sales_file(&args[1]));
    let purchases = load_or_exit(load_purchases_file(&args[2]));
    let snapshots = load_or_exit(load_snapshots_file(&args[3]));

    let started = Instant::now();
    let run = match MasterDatasetPipeline::new().run(&sales, &purchases, &snapshots) {
        Ok(run) => run,
        Err(PipelineError::ValidationFailed(report)) => {
            eprintln!("run failed hard validation: {report}");
            for order in report
                .duplicate_orders
                .iter()
                .chain(&report.missing_field_orders)
                .chain(&report.spurious_full_margin_orders)
                .take(20)
            {
                eprintln!("  offending sales order: {order}");
            }
            process::exit(1);
        }
        Err(err) => {
            eprintln!("pipeline error: {err}");
            process::exit(2);
        }
    };
    let pipeline_ms = started.elapsed().as_millis();

    if let Err(err) = write_output(output_path, &run.rows) {
        eprintln!("failed to write '{output_path}': {err}");
        process::exit(2);
    }

    let summary = RunSummaryJson {
        generated_at: Utc::now().to_rfc3339(),
        sales_rows: sales.len(),
        purchase_rows: purchases.len(),
        snapshot_rows: snapshots.len(),
        output_rows: run.rows.len(),
        products_with_cost: run.products_with_cost,
        snapshot_groups: run.snapshot_groups,
        cost_coverage_pct: run.report.cost_coverage() * 100.0,
        inventory_coverage_pct: run.report.inventory_coverage() * 100.0,
        pipeline_ms,
        output_file: output_path.to_string(),
        report: run.report,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize run summary: {err}");
            process::exit(2);
        }
    }
}

fn load_or_exit<T>(result: Result<Vec<T>, PipelineError>) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(err) => {
            eprintln!("load error: {err}");
            process::exit(2);
        }
    }
}

/// Write the enriched table. `Option` fields serialize as empty cells —
/// the distinct "missing" marker the output contract requires.
fn write_output(path: &str, rows: &[EnrichedTransaction]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
