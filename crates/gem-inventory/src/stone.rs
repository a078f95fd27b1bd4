use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{InventoryError, Result};

pub const STOCK_ID: &str = "stock_id";
pub const CUT: &str = "cut";
pub const CARAT: &str = "carat";
pub const CLARITY: &str = "clarity";
pub const CUT_QUALITY: &str = "cut_quality";
pub const LAB: &str = "lab";
pub const PRICE: &str = "total_sales_price";

/// Older exports name the carat column `carat_weight`.
pub const CARAT_ALIAS: &str = "carat_weight";

/// Columns every stone table must carry, in canonical output order.
pub const STONE_COLUMNS: [&str; 7] = [STOCK_ID, CUT, CARAT, CLARITY, CUT_QUALITY, LAB, PRICE];

/// One diamond in the catalog, identified by `stock_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stone {
    pub stock_id: String,
    pub cut: String,
    pub carat: Decimal,
    pub clarity: String,
    pub cut_quality: String,
    pub lab: String,
    #[serde(rename = "total_sales_price")]
    pub price: Decimal,
    /// Every other column of the source row (color, polish, ...)
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Stone {
    /// Look up a column by name, covering both the typed fields and extra attributes.
    pub fn field(&self, column: &str) -> Option<String> {
        match column {
            STOCK_ID => Some(self.stock_id.clone()),
            CUT => Some(self.cut.clone()),
            CARAT | CARAT_ALIAS => Some(self.carat.to_string()),
            CLARITY => Some(self.clarity.clone()),
            CUT_QUALITY => Some(self.cut_quality.clone()),
            LAB => Some(self.lab.clone()),
            PRICE => Some(self.price.to_string()),
            other => self.attributes.get(other).cloned(),
        }
    }
}

/// Header positions of the stone columns in a CSV source.
#[derive(Debug, Clone)]
pub(crate) struct StoneColumns {
    stock_id: usize,
    cut: usize,
    carat: usize,
    clarity: usize,
    cut_quality: usize,
    lab: usize,
    price: usize,
    extras: Vec<(usize, String)>,
}

impl StoneColumns {
    /// Map headers to positions. Columns listed in `reserved` are neither
    /// required nor kept as extra attributes.
    pub(crate) fn resolve(
        headers: &csv::StringRecord,
        path: &Path,
        reserved: &[&str],
    ) -> Result<Self> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let position = |name: &str| names.iter().position(|h| *h == name);

        let carat_column = if position(CARAT).is_some() {
            CARAT
        } else if position(CARAT_ALIAS).is_some() {
            log::debug!("{}: using '{CARAT_ALIAS}' as carat column", path.display());
            CARAT_ALIAS
        } else {
            CARAT
        };

        let wanted = [STOCK_ID, CUT, carat_column, CLARITY, CUT_QUALITY, LAB, PRICE];
        let missing: Vec<String> = wanted
            .iter()
            .filter(|c| position(**c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(InventoryError::Schema {
                path: path.to_path_buf(),
                missing,
            });
        }

        let idx = |name: &str| position(name).unwrap_or_default();
        let extras = names
            .iter()
            .enumerate()
            .filter(|(_, name)| !wanted.contains(*name) && !reserved.contains(*name))
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (i, name.to_string()))
            .collect();

        Ok(Self {
            stock_id: idx(STOCK_ID),
            cut: idx(CUT),
            carat: idx(carat_column),
            clarity: idx(CLARITY),
            cut_quality: idx(CUT_QUALITY),
            lab: idx(LAB),
            price: idx(PRICE),
            extras,
        })
    }

    /// Names of the extra attribute columns, in source order.
    pub(crate) fn extra_names(&self) -> impl Iterator<Item = &str> {
        self.extras.iter().map(|(_, name)| name.as_str())
    }

    /// Build a stone from one record, validating its numeric fields.
    pub(crate) fn stone(&self, record: &csv::StringRecord, path: &Path) -> Result<Stone> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let invalid = |reason: String| InventoryError::InvalidRecord {
            path: path.to_path_buf(),
            line,
            reason,
        };
        let text = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let decimal = |i: usize, name: &str| {
            let raw = text(i);
            Decimal::from_str(&raw).map_err(|_| invalid(format!("{name} '{raw}' is not a number")))
        };

        let stock_id = text(self.stock_id);
        if stock_id.is_empty() {
            return Err(invalid("empty stock_id".to_string()));
        }

        let carat = decimal(self.carat, CARAT)?;
        if carat <= Decimal::ZERO {
            return Err(invalid(format!("carat must be positive, got {carat}")));
        }

        let price = decimal(self.price, PRICE)?;
        if price < Decimal::ZERO {
            return Err(invalid(format!("price must not be negative, got {price}")));
        }

        let attributes = self
            .extras
            .iter()
            .map(|(i, name)| (name.clone(), text(*i)))
            .collect();

        Ok(Stone {
            stock_id,
            cut: text(self.cut),
            carat,
            clarity: text(self.clarity),
            cut_quality: text(self.cut_quality),
            lab: text(self.lab),
            price,
            attributes,
        })
    }
}
