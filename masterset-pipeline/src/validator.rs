//! Post-hoc invariant checks over the enriched output.
//!
//! Hard invariants fail the run with the offending keys attached:
//! duplicate transaction ids, missing mandatory fields, and 100%-margin
//! rows that do not come from a genuinely zero COGS (the zero-cost
//! defaulting bug class). Soft invariants — coverage ratios under their
//! configured floors — only warn; coverage gaps are reported, never
//! silently dropped.

use std::fmt;

use serde::Serialize;

use crate::types::EnrichedTransaction;

/// Floor below which cost coverage is flagged. The reference run resolves
/// a cost profile for 99.82% of sales rows.
pub const DEFAULT_MIN_COST_COVERAGE: f64 = 0.998;

/// Floor for inventory-match coverage. The reference run matches 99.16%
/// of rows; sales predating the first snapshot account for the rest.
pub const DEFAULT_MIN_INVENTORY_COVERAGE: f64 = 0.99;

/// Coverage thresholds for the soft invariants.
#[derive(Clone, Copy, Debug)]
pub struct ValidationConfig {
    pub min_cost_coverage: f64,
    pub min_inventory_coverage: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_cost_coverage: DEFAULT_MIN_COST_COVERAGE,
            min_inventory_coverage: DEFAULT_MIN_INVENTORY_COVERAGE,
        }
    }
}

/// Margin distribution over rows where the margin is defined.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct MarginStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Outcome of validating one enriched table.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub cost_covered: usize,
    pub inventory_covered: usize,

    /// Sales orders whose margin reads exactly 100% without a genuinely
    /// zero COGS. Hard violation; must be empty.
    pub spurious_full_margin_orders: Vec<String>,
    /// Rows with a real zero cost and therefore a true 100% margin.
    pub true_zero_cost_full_margins: usize,
    /// Sales orders appearing more than once. Hard violation.
    pub duplicate_orders: Vec<String>,
    /// Sales orders with an empty id or non-finite quantity/price/tax.
    /// Hard violation.
    pub missing_field_orders: Vec<String>,

    pub margin_stats: Option<MarginStats>,
    /// Soft-invariant findings (coverage under threshold).
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn cost_coverage(&self) -> f64 {
        ratio(self.cost_covered, self.total_rows)
    }

    pub fn inventory_coverage(&self) -> f64 {
        ratio(self.inventory_covered, self.total_rows)
    }

    /// True when any hard invariant is violated and the run must fail.
    pub fn has_hard_failures(&self) -> bool {
        !self.spurious_full_margin_orders.is_empty()
            || !self.duplicate_orders.is_empty()
            || !self.missing_field_orders.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, cost coverage {:.2}%, inventory coverage {:.2}%, \
             {} spurious 100%-margin, {} duplicate ids, {} rows with missing fields",
            self.total_rows,
            self.cost_coverage() * 100.0,
            self.inventory_coverage() * 100.0,
            self.spurious_full_margin_orders.len(),
            self.duplicate_orders.len(),
            self.missing_field_orders.len(),
        )
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Validate the enriched table. Reports findings; never mutates or drops
/// rows.
pub fn validate(rows: &[EnrichedTransaction], config: &ValidationConfig) -> ValidationReport {
    let mut report = ValidationReport {
        total_rows: rows.len(),
        ..Default::default()
    };

    let mut seen = std::collections::HashSet::with_capacity(rows.len());
    let mut margins: Vec<f64> = Vec::new();

    for row in rows {
        if row.has_cost() {
            report.cost_covered += 1;
        }
        if row.has_inventory() {
            report.inventory_covered += 1;
        }

        if !seen.insert(row.sales_order.as_str()) {
            report.duplicate_orders.push(row.sales_order.clone());
        }

        if row.sales_order.is_empty()
            || !row.sales_quantity.is_finite()
            || !row.sales_price.is_finite()
            || !row.tax.is_finite()
        {
            report.missing_field_orders.push(row.sales_order.clone());
        }

        if let Some(margin) = row.margin_percent {
            margins.push(margin);
            if margin == 100.0 {
                match row.cogs {
                    Some(cogs) if cogs == 0.0 => report.true_zero_cost_full_margins += 1,
                    _ => report
                        .spurious_full_margin_orders
                        .push(row.sales_order.clone()),
                }
            }
        }
    }

    report.margin_stats = margin_stats(&mut margins);

    if report.total_rows > 0 && report.cost_coverage() < config.min_cost_coverage {
        let warning = format!(
            "cost coverage {:.2}% below {:.2}% floor ({} of {} rows have no cost profile)",
            report.cost_coverage() * 100.0,
            config.min_cost_coverage * 100.0,
            report.total_rows - report.cost_covered,
            report.total_rows,
        );
        log::warn!("{warning}");
        report.warnings.push(warning);
    }
    if report.total_rows > 0 && report.inventory_coverage() < config.min_inventory_coverage {
        let warning = format!(
            "inventory coverage {:.2}% below {:.2}% floor ({} of {} rows have no prior snapshot)",
            report.inventory_coverage() * 100.0,
            config.min_inventory_coverage * 100.0,
            report.total_rows - report.inventory_covered,
            report.total_rows,
        );
        log::warn!("{warning}");
        report.warnings.push(warning);
    }

    report
}

fn margin_stats(margins: &mut [f64]) -> Option<MarginStats> {
    if margins.is_empty() {
        return None;
    }
    margins.sort_by(|a, b| a.total_cmp(b));
    let n = margins.len();
    let median = if n % 2 == 1 {
        margins[n / 2]
    } else {
        (margins[n / 2 - 1] + margins[n / 2]) / 2.0
    };
    Some(MarginStats {
        mean: margins.iter().sum::<f64>() / n as f64,
        median,
        min: margins[0],
        max: margins[n - 1],
    })
}
