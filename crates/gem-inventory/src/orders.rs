use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::append::open_log;
use crate::error::{InventoryError, Result};
use crate::stone::{STONE_COLUMNS, Stone, StoneColumns};

pub const CUSTOMER_NAME: &str = "Customer Name";
pub const ORDER_ID: &str = "order_id";
pub const PLACED_AT: &str = "placed_at";

/// A placed order: the stones allocated to one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    /// Absent for rows written before order ids were recorded
    pub order_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
    pub customer_name: String,
    pub stones: Vec<Stone>,
    pub total_carat: Decimal,
    pub total_price: Decimal,
}

impl OrderRecord {
    /// New order stamped with a fresh id and the current time.
    pub fn new(customer_name: impl Into<String>, stones: Vec<Stone>) -> Self {
        Self::from_parts(Some(Uuid::new_v4()), Some(Utc::now()), customer_name.into(), stones)
    }

    fn from_parts(
        order_id: Option<Uuid>,
        placed_at: Option<DateTime<Utc>>,
        customer_name: String,
        stones: Vec<Stone>,
    ) -> Self {
        let total_carat = stones.iter().map(|s| s.carat).sum();
        let total_price = stones.iter().map(|s| s.price).sum();
        Self {
            order_id,
            placed_at,
            customer_name,
            stones,
            total_carat,
            total_price,
        }
    }

    pub fn quantity(&self) -> usize {
        self.stones.len()
    }
}

/// A stone as recorded in the order log, with the order it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEntry {
    pub stone: Stone,
    pub customer_name: String,
    pub order_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
}

/// Append-only CSV log of ordered stones, one row per stone.
#[derive(Debug, Clone)]
pub struct OrderLog {
    path: PathBuf,
}

impl OrderLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every stone of `record`.
    ///
    /// A new log gets the stone columns, any extra catalog attributes, then
    /// `Customer Name`, `order_id` and `placed_at`. An existing log keeps its
    /// header: rows are written in its column order, and values for columns
    /// it lacks (such as `order_id` in older logs) are left out.
    pub fn append(&self, record: &OrderRecord) -> Result<()> {
        let path = &self.path;
        let target = open_log(path)?;
        let (header, needs_header) = match target.header {
            Some(header) => (header, false),
            None => (new_header(&record.stones), true),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(target.file);
        if needs_header {
            writer
                .write_record(&header)
                .map_err(|e| InventoryError::csv(path, e))?;
        }

        let order_id = record.order_id.map(|id| id.to_string()).unwrap_or_default();
        let placed_at = record
            .placed_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        for stone in &record.stones {
            let row = header.iter().map(|column| match column.as_str() {
                CUSTOMER_NAME => record.customer_name.clone(),
                ORDER_ID => order_id.clone(),
                PLACED_AT => placed_at.clone(),
                other => stone.field(other).unwrap_or_default(),
            });
            writer
                .write_record(row)
                .map_err(|e| InventoryError::csv(path, e))?;
        }
        writer.flush().map_err(|e| InventoryError::io(path, e))?;

        log::debug!(
            "Appended {} rows for {} to {}",
            record.stones.len(),
            record.customer_name,
            path.display()
        );
        Ok(())
    }

    /// Every row of the log in append order. A missing log is empty.
    pub fn entries(&self) -> Result<Vec<OrderEntry>> {
        let path = &self.path;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| InventoryError::csv(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| InventoryError::csv(path, e))?
            .clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let customer = position(CUSTOMER_NAME);
        let order_id = position(ORDER_ID);
        let placed_at = position(PLACED_AT);

        let columns = match StoneColumns::resolve(&headers, path, &[CUSTOMER_NAME, ORDER_ID, PLACED_AT]) {
            Ok(columns) => columns,
            Err(InventoryError::Schema { path, mut missing }) => {
                if customer.is_none() {
                    missing.push(CUSTOMER_NAME.to_string());
                }
                return Err(InventoryError::Schema { path, missing });
            }
            Err(e) => return Err(e),
        };
        let customer = customer.ok_or_else(|| InventoryError::Schema {
            path: path.clone(),
            missing: vec![CUSTOMER_NAME.to_string()],
        })?;

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| InventoryError::csv(path, e))?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let invalid = |reason: String| InventoryError::InvalidRecord {
                path: path.clone(),
                line,
                reason,
            };
            let optional = |i: Option<usize>| {
                i.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            };

            let order_id = optional(order_id)
                .map(|raw| {
                    Uuid::parse_str(raw).map_err(|_| invalid(format!("invalid order_id '{raw}'")))
                })
                .transpose()?;
            let placed_at = optional(placed_at)
                .map(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|_| invalid(format!("invalid placed_at '{raw}'")))
                })
                .transpose()?;

            entries.push(OrderEntry {
                stone: columns.stone(&record, path)?,
                customer_name: record.get(customer).unwrap_or("").trim().to_string(),
                order_id,
                placed_at,
            });
        }

        log::debug!("Read {} order rows from {}", entries.len(), path.display());
        Ok(entries)
    }

    /// All stones ever ordered, flattened across orders.
    pub fn stones(&self) -> Result<Vec<Stone>> {
        Ok(self.entries()?.into_iter().map(|e| e.stone).collect())
    }

    /// Rows grouped back into orders, in the order they were first placed.
    ///
    /// Rows without an order id are grouped by consecutive runs of the same
    /// customer.
    pub fn records(&self) -> Result<Vec<OrderRecord>> {
        Ok(group_entries(self.entries()?))
    }
}

fn new_header(stones: &[Stone]) -> Vec<String> {
    let attributes: BTreeSet<&str> = stones
        .iter()
        .flat_map(|stone| stone.attributes.keys().map(String::as_str))
        .collect();
    STONE_COLUMNS
        .into_iter()
        .chain(attributes)
        .chain([CUSTOMER_NAME, ORDER_ID, PLACED_AT])
        .map(str::to_string)
        .collect()
}

fn group_entries(entries: Vec<OrderEntry>) -> Vec<OrderRecord> {
    struct Group {
        order_id: Option<Uuid>,
        placed_at: Option<DateTime<Utc>>,
        customer_name: String,
        stones: Vec<Stone>,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut by_id: HashMap<Uuid, usize> = HashMap::new();

    for entry in entries {
        let existing = match entry.order_id {
            Some(id) => by_id.get(&id).copied(),
            None => groups
                .last()
                .filter(|g| g.order_id.is_none() && g.customer_name == entry.customer_name)
                .map(|_| groups.len() - 1),
        };

        match existing {
            Some(index) => groups[index].stones.push(entry.stone),
            None => {
                if let Some(id) = entry.order_id {
                    by_id.insert(id, groups.len());
                }
                groups.push(Group {
                    order_id: entry.order_id,
                    placed_at: entry.placed_at,
                    customer_name: entry.customer_name,
                    stones: vec![entry.stone],
                });
            }
        }
    }

    groups
        .into_iter()
        .map(|g| OrderRecord::from_parts(g.order_id, g.placed_at, g.customer_name, g.stones))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::testing::{write_catalog, SAMPLE_CATALOG};
    use rust_decimal_macros::dec;

    fn stones(ids: &[&str]) -> Vec<Stone> {
        let (_dir, path) = write_catalog(SAMPLE_CATALOG);
        let catalog = Catalog::load(&path).unwrap();
        ids.iter()
            .map(|id| catalog.get(id).cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_record_totals() {
        let record = OrderRecord::new("Alice", stones(&["R1", "R2"]));
        assert_eq!(record.quantity(), 2);
        assert_eq!(record.total_carat, dec!(2.10));
        assert_eq!(record.total_price, dec!(10500.50));
        assert!(record.order_id.is_some());
    }

    #[test]
    fn test_append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("order_details.csv"));

        let first = OrderRecord::new("Alice", stones(&["R1", "R2"]));
        let second = OrderRecord::new("Bob", stones(&["P1"]));
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let header_lines = contents
            .lines()
            .filter(|l| l.starts_with("stock_id,"))
            .count();
        assert_eq!(header_lines, 1);
        assert!(contents.starts_with(
            "stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,color,Customer Name,order_id,placed_at\n\
             R1,Round,1.00,VS1,Excellent,GIA,5000.00,E,Alice,"
        ));

        let sold: Vec<String> = log.stones().unwrap().into_iter().map(|s| s.stock_id).collect();
        assert_eq!(sold, vec!["R1", "R2", "P1"]);

        let records = log.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_id, first.order_id);
        assert_eq!(records[0].customer_name, "Alice");
        assert_eq!(records[0].total_price, dec!(10500.50));
        assert_eq!(records[1].customer_name, "Bob");
        assert_eq!(records[1].quantity(), 1);
        assert_eq!(
            records[1].stones[0].attributes.get("color").map(String::as_str),
            Some("G")
        );
    }

    #[test]
    fn test_append_to_legacy_log_follows_its_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order_details.csv");
        std::fs::write(
            &path,
            "stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,Customer Name\n\
             O1,Oval,0.90,VS2,Very Good,IGI,3000.00,Bob\n",
        )
        .unwrap();

        let log = OrderLog::new(&path);
        log.append(&OrderRecord::new("Alice", stones(&["R1"]))).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,Customer Name\n\
             O1,Oval,0.90,VS2,Very Good,IGI,3000.00,Bob\n\
             R1,Round,1.00,VS1,Excellent,GIA,5000.00,Alice\n"
        );

        let entries = log.entries().unwrap();
        let summary: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.stone.stock_id.as_str(), e.customer_name.as_str()))
            .collect();
        assert_eq!(summary, vec![("O1", "Bob"), ("R1", "Alice")]);
        assert!(entries.iter().all(|e| e.order_id.is_none()));
    }

    #[test]
    fn test_append_after_unterminated_row() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("order_details.csv"));
        log.append(&OrderRecord::new("Bob", stones(&["O1"]))).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        std::fs::write(log.path(), contents.trim_end()).unwrap();
        log.append(&OrderRecord::new("Alice", stones(&["R1"]))).unwrap();

        let sold: Vec<String> = log.stones().unwrap().into_iter().map(|s| s.stock_id).collect();
        assert_eq!(sold, vec!["O1", "R1"]);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("order_details.csv"));
        assert!(log.entries().unwrap().is_empty());
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_rows_group_by_customer_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order_details.csv");
        std::fs::write(
            &path,
            "stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,color,Customer Name\n\
             R1,Round,1.00,VS1,Excellent,GIA,5000,E,Alice\n\
             R2,Round,1.10,VS1,Excellent,GIA,5500,D,Alice\n\
             O1,Oval,0.90,VS2,Very Good,IGI,3000,G,Bob\n\
             R3,Round,1.20,VS1,Excellent,GIA,6000,E,Alice\n",
        )
        .unwrap();

        let records = OrderLog::new(&path).records().unwrap();
        let summary: Vec<(&str, usize)> = records
            .iter()
            .map(|r| (r.customer_name.as_str(), r.quantity()))
            .collect();
        assert_eq!(summary, vec![("Alice", 2), ("Bob", 1), ("Alice", 1)]);
        assert!(records.iter().all(|r| r.order_id.is_none()));
        assert_eq!(
            records[0].stones[0].attributes.get("color").map(String::as_str),
            Some("E")
        );
    }

    #[test]
    fn test_missing_customer_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order_details.csv");
        std::fs::write(
            &path,
            "stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price\n\
             R1,Round,1.00,VS1,Excellent,GIA,5000\n",
        )
        .unwrap();

        let err = OrderLog::new(&path).entries().unwrap_err();
        assert!(err.to_string().contains("Customer Name"), "{err}");
    }
}
