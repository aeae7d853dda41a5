//! Master dataset construction pipeline.
//!
//! Stage order:
//! 1. Cost Resolver and Inventory Matcher build their lookup structures
//!    from the purchase and snapshot facts (independent, run concurrently)
//! 2. Metric Enricher maps every sales row against both lookups
//! 3. Validator checks the enriched table and fails the run on any hard
//!    invariant violation
//!
//! The whole run is a pure batch transform over immutable inputs:
//! identical inputs always produce identical outputs, and a failed run is
//! simply re-executed in full.

use crate::cost_resolver::CostBook;
use crate::enricher::enrich_all;
use crate::error::{PipelineError, PipelineResult};
use crate::inventory_matcher::SnapshotIndex;
use crate::types::{EnrichedTransaction, InventorySnapshot, PurchaseRecord, SalesTransaction};
use crate::validator::{validate, ValidationConfig, ValidationReport};

/// A successful run: the enriched table plus its validation report.
#[derive(Debug)]
pub struct MasterRun {
    /// One row per input sales transaction, input order preserved.
    pub rows: Vec<EnrichedTransaction>,
    pub report: ValidationReport,
    /// Products that resolved a cost profile.
    pub products_with_cost: usize,
    /// (product, store) snapshot partitions in the index.
    pub snapshot_groups: usize,
}

#[derive(Debug, Default)]
pub struct MasterDatasetPipeline {
    config: ValidationConfig,
}

impl MasterDatasetPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Run the full transform. Returns `Err(ValidationFailed)` carrying
    /// the report when a hard invariant is violated; soft coverage
    /// shortfalls surface as warnings inside the report.
    pub fn run(
        &self,
        sales: &[SalesTransaction],
        purchases: &[PurchaseRecord],
        snapshots: &[InventorySnapshot],
    ) -> PipelineResult<MasterRun> {
        log::info!(
            "building master dataset: {} sales, {} purchase lines, {} snapshots",
            sales.len(),
            purchases.len(),
            snapshots.len()
        );

        // The two lookup builds share no data; build them side by side.
        let (cost_book, snapshot_index) = rayon::join(
            || CostBook::from_purchases(purchases),
            || SnapshotIndex::build(snapshots),
        );
        log::info!(
            "cost profiles for {} products ({} skipped with zero quantity), {} snapshot partitions",
            cost_book.len(),
            cost_book.zero_quantity_products().len(),
            snapshot_index.group_count()
        );

        let rows = enrich_all(sales, &cost_book, &snapshot_index);
        debug_assert_eq!(rows.len(), sales.len());

        let report = validate(&rows, &self.config);
        log::info!("validation: {report}");

        if report.has_hard_failures() {
            return Err(PipelineError::ValidationFailed(Box::new(report)));
        }

        Ok(MasterRun {
            rows,
            report,
            products_with_cost: cost_book.len(),
            snapshot_groups: snapshot_index.group_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 1, d).unwrap()
    }

    fn sale(order: &str, product: u32, day: u32) -> SalesTransaction {
        SalesTransaction {
            sales_order: order.to_string(),
            product_number: product,
            store: 10,
            sales_date: date(day),
            sales_quantity: 2.0,
            sales_price: 20.0,
            tax: 0.0,
        }
    }

    fn purchase(product: u32, qty: f64, unit_cost: f64) -> PurchaseRecord {
        PurchaseRecord {
            purchase_order: "PO-1".into(),
            product_number: product,
            store: 10,
            purchase_date: date(2),
            quantity_purchased: qty,
            unit_cost,
            freight_cost: 0.0,
        }
    }

    #[test]
    fn run_preserves_cardinality_and_passes() {
        let pipeline = MasterDatasetPipeline::new();
        let sales = vec![sale("SO-1", 1, 10), sale("SO-2", 1, 11)];
        let run = pipeline
            .run(&sales, &[purchase(1, 100.0, 8.0)], &[])
            .unwrap();
        assert_eq!(run.rows.len(), sales.len());
        assert_eq!(run.products_with_cost, 1);
        // No snapshots loaded: inventory coverage warning only, not a failure.
        assert!(!run.report.warnings.is_empty());
    }

    #[test]
    fn duplicate_sales_orders_fail_the_run() {
        let pipeline = MasterDatasetPipeline::new();
        let sales = vec![sale("SO-1", 1, 10), sale("SO-1", 1, 11)];
        let err = pipeline
            .run(&sales, &[purchase(1, 100.0, 8.0)], &[])
            .unwrap_err();
        match err {
            PipelineError::ValidationFailed(report) => {
                assert_eq!(report.duplicate_orders, vec!["SO-1".to_string()]);
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }
}
