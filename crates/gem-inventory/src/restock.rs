use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};
use crate::stone::Stone;

/// Stock versus sales for one (cut, clarity) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub cut: String,
    pub clarity: String,
    pub stock_quantity: i64,
    pub sold_quantity: i64,
    /// Not clamped: an order log that sold more than the catalog holds goes negative
    pub remaining_stock: i64,
    pub low_stock: bool,
}

/// Restocking report, rebuilt from the catalog and order history on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RestockReport {
    rows: Vec<InventoryStatus>,
}

impl RestockReport {
    /// Join catalog stock with sold stones by (cut, clarity).
    ///
    /// Only groups present in the catalog are reported; sales of groups the
    /// catalog no longer carries are dropped. Rows are sorted by cut, then
    /// clarity.
    pub fn compute(catalog: &[Stone], sold: &[Stone], threshold: i64) -> Self {
        let mut stock: BTreeMap<(&str, &str), i64> = BTreeMap::new();
        for stone in catalog {
            *stock
                .entry((stone.cut.as_str(), stone.clarity.as_str()))
                .or_default() += 1;
        }

        let mut sales: BTreeMap<(&str, &str), i64> = BTreeMap::new();
        for stone in sold {
            *sales
                .entry((stone.cut.as_str(), stone.clarity.as_str()))
                .or_default() += 1;
        }

        for (cut, clarity) in sales.keys().filter(|key| !stock.contains_key(*key)) {
            log::warn!("Sold stones in ({cut}, {clarity}) have no catalog stock; skipping");
        }

        let rows = stock
            .into_iter()
            .map(|((cut, clarity), stock_quantity)| {
                let sold_quantity = sales.get(&(cut, clarity)).copied().unwrap_or(0);
                let remaining_stock = stock_quantity - sold_quantity;
                InventoryStatus {
                    cut: cut.to_string(),
                    clarity: clarity.to_string(),
                    stock_quantity,
                    sold_quantity,
                    remaining_stock,
                    low_stock: remaining_stock < threshold,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[InventoryStatus] {
        &self.rows
    }

    pub fn low_stock(&self) -> impl Iterator<Item = &InventoryStatus> {
        self.rows.iter().filter(|row| row.low_stock)
    }

    /// Render the report as CSV.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer
                .serialize(row)
                .map_err(|e| InventoryError::csv("<restock report>", e))?;
        }
        if self.rows.is_empty() {
            writer
                .write_record(REPORT_COLUMNS)
                .map_err(|e| InventoryError::csv("<restock report>", e))?;
        }
        writer
            .into_inner()
            .map_err(|e| InventoryError::io("<restock report>", e.into_error()))
    }

    /// Replace the report file at `path` in one atomic rename.
    pub fn write(&self, path: &Path) -> Result<()> {
        let contents = self.to_csv()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| InventoryError::io(parent, e))?;
        }
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(&contents)?;
                f.flush()
            })
            .map_err(|err| InventoryError::io(path, std::io::Error::other(err.to_string())))?;
        log::info!(
            "Wrote restock report with {} groups to {}",
            self.rows.len(),
            path.display()
        );
        Ok(())
    }
}

const REPORT_COLUMNS: [&str; 6] = [
    "cut",
    "clarity",
    "stock_quantity",
    "sold_quantity",
    "remaining_stock",
    "low_stock",
];
