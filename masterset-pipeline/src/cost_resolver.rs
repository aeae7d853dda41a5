//! Weighted Average Cost resolution.
//!
//! Aggregates the complete purchase history per product — across all
//! stores and dates in the window — into one `CostProfile`:
//!
//!   WAC              = Σ(qty × unit_cost) / Σ(qty)
//!   freight_per_unit = Σ(freight) / Σ(qty)
//!
//! Both are quantity-weighted, never row-averaged: a product bought once
//! in bulk and once in a small lot weights by volume, not by line count.
//! There is no direct purchase-order-to-sale linking; the single WAC
//! applies to every sale of the product.

use std::collections::HashMap;

use crate::types::{CostProfile, ProductId, PurchaseRecord};

#[derive(Default)]
struct CostAccumulator {
    quantity: f64,
    weighted_cost: f64,
    freight: f64,
}

/// Immutable per-product cost lookup, built once per run from the full
/// purchase history and passed by reference into enrichment.
#[derive(Debug, Default)]
pub struct CostBook {
    profiles: HashMap<ProductId, CostProfile>,
    zero_quantity_products: Vec<ProductId>,
}

impl CostBook {
    /// Build the cost book from the purchase fact table.
    ///
    /// Products whose total purchased quantity is zero get no profile at
    /// all (not a zero-cost one) — dividing by that quantity is exactly
    /// the failure this guards against. They are tracked separately so
    /// the validator can report them.
    pub fn from_purchases(purchases: &[PurchaseRecord]) -> Self {
        let mut totals: HashMap<ProductId, CostAccumulator> = HashMap::new();
        for line in purchases {
            let acc = totals.entry(line.product_number).or_default();
            acc.quantity += line.quantity_purchased;
            acc.weighted_cost += line.quantity_purchased * line.unit_cost;
            acc.freight += line.freight_cost;
        }

        let mut profiles = HashMap::with_capacity(totals.len());
        let mut zero_quantity_products = Vec::new();
        for (product, acc) in totals {
            if acc.quantity > 0.0 {
                profiles.insert(
                    product,
                    CostProfile {
                        wac: acc.weighted_cost / acc.quantity,
                        freight_per_unit: acc.freight / acc.quantity,
                        source_quantity: acc.quantity,
                    },
                );
            } else {
                zero_quantity_products.push(product);
            }
        }
        zero_quantity_products.sort_unstable();

        Self {
            profiles,
            zero_quantity_products,
        }
    }

    /// Cost profile for a product, or `None` when the product has no
    /// usable purchase history in the window. Absence is expected for
    /// sold-but-never-purchased products, not an error.
    pub fn get(&self, product: ProductId) -> Option<&CostProfile> {
        self.profiles.get(&product)
    }

    /// Number of products with a resolved profile.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Products whose purchase lines summed to zero quantity.
    pub fn zero_quantity_products(&self) -> &[ProductId] {
        &self.zero_quantity_products
    }
}
