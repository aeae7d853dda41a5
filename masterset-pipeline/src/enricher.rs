//! Per-row metric derivation.
//!
//! Combines a sales row with its resolved cost profile and matched
//! snapshot into one `EnrichedTransaction`:
//!
//!   Revenue        = Sales_Quantity × Sales_Price   (always)
//!   Purchase_Cost  = Sales_Quantity × WAC
//!   Freight_Cost   = Sales_Quantity × Freight_per_Unit
//!   Landed_Cost    = WAC + Freight_per_Unit
//!   COGS           = Purchase_Cost + Freight_Cost
//!   Gross_Profit   = Revenue − COGS
//!   Margin_Percent = Gross_Profit / Revenue × 100   (positive revenue only)
//!
//! Each row is derived independently from the two read-only lookup
//! structures, so the whole step is a parallel map with no shared
//! mutable state.

use rayon::prelude::*;

use crate::cost_resolver::CostBook;
use crate::inventory_matcher::SnapshotIndex;
use crate::types::{CostProfile, EnrichedTransaction, InventoryMatch, SalesTransaction};

/// Enrich one sales transaction. Pure function of its three inputs.
///
/// When `cost` is `None` every cost and profit field stays `None`. They
/// must never default to zero: a zero cost silently reports a false 100%
/// margin, the exact artifact this pipeline was built to remove.
pub fn enrich_one(
    tx: &SalesTransaction,
    cost: Option<&CostProfile>,
    inventory: Option<InventoryMatch>,
) -> EnrichedTransaction {
    let revenue = tx.sales_quantity * tx.sales_price;

    let purchase_cost = cost.map(|c| tx.sales_quantity * c.wac);
    let freight_cost = cost.map(|c| tx.sales_quantity * c.freight_per_unit);
    let cogs = cost.map(|c| tx.sales_quantity * c.landed_cost());
    let gross_profit = cogs.map(|cogs| revenue - cogs);
    let margin_percent = gross_profit.and_then(|gp| {
        if revenue > 0.0 {
            Some(gp / revenue * 100.0)
        } else {
            None
        }
    });

    EnrichedTransaction {
        sales_order: tx.sales_order.clone(),
        product_number: tx.product_number,
        store: tx.store,
        sales_date: tx.sales_date,
        sales_quantity: tx.sales_quantity,
        sales_price: tx.sales_price,
        tax: tx.tax,
        revenue,
        net_revenue: revenue - tx.tax,
        wac: cost.map(|c| c.wac),
        freight_per_unit: cost.map(|c| c.freight_per_unit),
        purchase_cost,
        freight_cost,
        landed_cost: cost.map(CostProfile::landed_cost),
        cogs,
        gross_profit,
        margin_percent,
        on_hand_quantity: inventory.as_ref().map(|m| m.on_hand_quantity),
        inventory_value: inventory.as_ref().map(|m| m.inventory_value),
        snapshot_date: inventory.as_ref().map(|m| m.snapshot_date),
        snapshot_type: inventory.as_ref().map(|m| m.snapshot_type),
        abc_class: None,
        xyz_class: None,
    }
}

/// Enrich the full sales set in parallel. Output order follows input
/// order and the row count is preserved exactly.
pub fn enrich_all(
    sales: &[SalesTransaction],
    costs: &CostBook,
    snapshots: &SnapshotIndex,
) -> Vec<EnrichedTransaction> {
    sales
        .par_iter()
        .map(|tx| {
            enrich_one(
                tx,
                costs.get(tx.product_number),
                snapshots.match_prior(tx.product_number, tx.store, tx.sales_date),
            )
        })
        .collect()
}
