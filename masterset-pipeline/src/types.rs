use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Product key, consistent across all three fact tables.
pub type ProductId = u32;
/// Store key shared by sales and inventory snapshots.
pub type StoreId = u32;

// ---------------------------------------------------------------------------
// Fact records (read-only inputs)
// ---------------------------------------------------------------------------

/// A single sales transaction. Identity: `sales_order` is unique.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SalesTransaction {
    pub sales_order: String,
    pub product_number: ProductId,
    pub store: StoreId,
    pub sales_date: NaiveDate,
    pub sales_quantity: f64,
    pub sales_price: f64,
    pub tax: f64,
}

/// One purchase-order line. Many lines may share a product; no uniqueness
/// beyond the natural (purchase_order, product, store) identity.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PurchaseRecord {
    pub purchase_order: String,
    pub product_number: ProductId,
    pub store: StoreId,
    pub purchase_date: NaiveDate,
    pub quantity_purchased: f64,
    pub unit_cost: f64,
    /// Freight billed on this purchase line, not yet allocated per unit.
    pub freight_cost: f64,
}

/// Whether a snapshot was taken at period open or close.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum SnapshotType {
    Beginning,
    Ending,
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotType::Beginning => write!(f, "Beginning"),
            SnapshotType::Ending => write!(f, "Ending"),
        }
    }
}

/// An inventory count for one (product, store) on one date.
/// Identity: (product_number, store, snapshot_date) is unique per type.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InventorySnapshot {
    pub product_number: ProductId,
    pub store: StoreId,
    pub snapshot_date: NaiveDate,
    pub on_hand_quantity: f64,
    pub inventory_value: f64,
    #[serde(deserialize_with = "crate::fact_loader::deserialize_snapshot_type")]
    pub snapshot_type: SnapshotType,
}

// ---------------------------------------------------------------------------
// Derived lookup values
// ---------------------------------------------------------------------------

/// Per-product costing derived from the full purchase history.
///
/// A profile only exists when the product's total purchased quantity is
/// positive; "no profile" is a distinct state from "zero cost".
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CostProfile {
    /// Weighted Average Cost: Σ(qty × unit_cost) / Σ(qty).
    pub wac: f64,
    /// Σ(freight) / Σ(qty) across the same history.
    pub freight_per_unit: f64,
    /// Total units purchased backing the average.
    pub source_quantity: f64,
}

impl CostProfile {
    /// Per-unit cost with freight included.
    pub fn landed_cost(&self) -> f64 {
        self.wac + self.freight_per_unit
    }
}

/// The nearest snapshot strictly preceding a sale for its (product, store).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InventoryMatch {
    pub on_hand_quantity: f64,
    pub inventory_value: f64,
    pub snapshot_date: NaiveDate,
    pub snapshot_type: SnapshotType,
}

// ---------------------------------------------------------------------------
// Output row
// ---------------------------------------------------------------------------

/// One output row per input sales transaction, cardinality preserved 1:1.
///
/// Derived fields are `Option` and stay `None` when their lookup failed:
/// an empty cell in CSV, `null` in JSON, never a defaulted zero. A zero
/// default would inflate margin to a false 100%, which is exactly the
/// artifact this pipeline eliminates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    // Transaction identity
    pub sales_order: String,
    pub product_number: ProductId,
    pub store: StoreId,
    pub sales_date: NaiveDate,

    // Sales metrics (always present)
    pub sales_quantity: f64,
    pub sales_price: f64,
    pub tax: f64,
    pub revenue: f64,
    pub net_revenue: f64,

    // Cost metrics, defined exactly when a CostProfile exists for the product
    pub wac: Option<f64>,
    pub freight_per_unit: Option<f64>,
    pub purchase_cost: Option<f64>,
    pub freight_cost: Option<f64>,
    pub landed_cost: Option<f64>,
    pub cogs: Option<f64>,

    // Profit metrics
    pub gross_profit: Option<f64>,
    /// Undefined when revenue is not positive, on top of requiring a cost
    /// profile. Avoids division-by-zero margins masquerading as 100%.
    pub margin_percent: Option<f64>,

    // Inventory metrics, defined exactly when a prior snapshot matched
    pub on_hand_quantity: Option<f64>,
    pub inventory_value: Option<f64>,
    pub snapshot_date: Option<NaiveDate>,
    pub snapshot_type: Option<SnapshotType>,

    // Segmentation placeholders; populated by a downstream classifier, not here
    pub abc_class: Option<String>,
    pub xyz_class: Option<String>,
}

impl EnrichedTransaction {
    /// True when the costing lookup resolved for this row's product.
    pub fn has_cost(&self) -> bool {
        self.wac.is_some()
    }

    /// True when a prior inventory snapshot matched this row.
    pub fn has_inventory(&self) -> bool {
        self.snapshot_date.is_some()
    }
}
