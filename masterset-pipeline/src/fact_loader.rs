//! CSV fact-table loaders.
//!
//! Parses the three fact extracts into typed records. Expected columns:
//!   sales:     sales_order, product_number, store, sales_date,
//!              sales_quantity, sales_price, tax
//!   purchases: purchase_order, product_number, store, purchase_date,
//!              quantity_purchased, unit_cost, freight_cost
//!   snapshots: product_number, store, snapshot_date, on_hand_quantity,
//!              inventory_value, snapshot_type
//!
//! Any row that fails to parse aborts the load. A malformed source file
//! means the upstream cleaning stage broke its contract, so no stage of
//! the pipeline runs on partial data.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{InventorySnapshot, PurchaseRecord, SalesTransaction, SnapshotType};

/// Load sales transactions from a CSV reader.
pub fn load_sales<R: Read>(reader: R) -> PipelineResult<Vec<SalesTransaction>> {
    load_table(reader, "fact_sales")
}

/// Load purchase records from a CSV reader.
pub fn load_purchases<R: Read>(reader: R) -> PipelineResult<Vec<PurchaseRecord>> {
    load_table(reader, "fact_purchases")
}

/// Load inventory snapshots from a CSV reader.
pub fn load_snapshots<R: Read>(reader: R) -> PipelineResult<Vec<InventorySnapshot>> {
    load_table(reader, "fact_inventory_snapshot")
}

pub fn load_sales_file<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<SalesTransaction>> {
    load_sales(open(path, "fact_sales")?)
}

pub fn load_purchases_file<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<PurchaseRecord>> {
    load_purchases(open(path, "fact_purchases")?)
}

pub fn load_snapshots_file<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<InventorySnapshot>> {
    load_snapshots(open(path, "fact_inventory_snapshot")?)
}

fn open<P: AsRef<Path>>(path: P, table: &'static str) -> PipelineResult<std::fs::File> {
    std::fs::File::open(&path).map_err(|source| PipelineError::Io {
        table,
        path: path.as_ref().display().to_string(),
        source,
    })
}

fn load_table<R: Read, T: DeserializeOwned>(
    reader: R,
    table: &'static str,
) -> PipelineResult<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        // +2: one for the header row, one for zero-based enumeration.
        let record: T = result.map_err(|e| PipelineError::MalformedRow {
            table,
            line: line_num + 2,
            message: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Flexible snapshot-type deserializer: accepts any casing plus the
/// abbreviations ("beg"/"end") seen in raw extracts.
pub(crate) fn deserialize_snapshot_type<'de, D>(deserializer: D) -> Result<SnapshotType, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().as_str() {
        "beginning" | "begin" | "beg" => Ok(SnapshotType::Beginning),
        "ending" | "end" => Ok(SnapshotType::Ending),
        other => Err(serde::de::Error::custom(format!(
            "expected snapshot type Beginning/Ending, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SALES_CSV: &str = "\
sales_order,product_number,store,sales_date,sales_quantity,sales_price,tax
SO-100001,5000,10,2016-01-15,2,19.99,1.20
SO-100002,5000,10,2016-01-16,1,19.99,0.60
SO-100003,6100,12,2016-01-16,5,4.50,1.35
";

    const SNAPSHOT_CSV: &str = "\
product_number,store,snapshot_date,on_hand_quantity,inventory_value,snapshot_type
5000,10,2016-01-01,150,1485.00,Beginning
5000,10,2016-01-31,120,1188.00,ending
";

    #[test]
    fn load_sample_sales() {
        let sales = load_sales(SALES_CSV.as_bytes()).unwrap();
        assert_eq!(sales.len(), 3);
        assert_eq!(sales[0].sales_order, "SO-100001");
        assert_eq!(sales[0].product_number, 5000);
        assert_eq!(
            sales[0].sales_date,
            NaiveDate::from_ymd_opt(2016, 1, 15).unwrap()
        );
        assert!((sales[2].sales_price - 4.50).abs() < 1e-9);
    }

    #[test]
    fn load_sample_snapshots_parses_type_case_insensitively() {
        let snaps = load_snapshots(SNAPSHOT_CSV.as_bytes()).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].snapshot_type, SnapshotType::Beginning);
        assert_eq!(snaps[1].snapshot_type, SnapshotType::Ending);
        assert!((snaps[1].inventory_value - 1188.0).abs() < 1e-9);
    }

    #[test]
    fn unparseable_date_is_fatal_with_line_number() {
        let bad = "\
sales_order,product_number,store,sales_date,sales_quantity,sales_price,tax
SO-1,5000,10,2016-01-15,2,19.99,1.20
SO-2,5000,10,not-a-date,1,19.99,0.60
";
        let err = load_sales(bad.as_bytes()).unwrap_err();
        match err {
            PipelineError::MalformedRow { table, line, .. } => {
                assert_eq!(table, "fact_sales");
                assert_eq!(line, 3);
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_fatal() {
        let bad = "\
sales_order,product_number,store,sales_date
SO-1,5000,10,2016-01-15
";
        assert!(load_sales(bad.as_bytes()).is_err());
    }
}
