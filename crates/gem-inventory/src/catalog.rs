use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::criteria::Criteria;
use crate::error::{InventoryError, Result};
use crate::natural_string::NaturalString;
use crate::stone::{CARAT_ALIAS, STONE_COLUMNS, Stone, StoneColumns};

/// Read-only view over the diamond stock table.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    attribute_columns: Vec<String>,
    stones: Vec<Stone>,
}

impl Catalog {
    /// Load the catalog CSV at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InventoryError::DataUnavailable {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| InventoryError::csv(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| InventoryError::csv(path, e))?
            .clone();
        let columns = StoneColumns::resolve(&headers, path, &[])?;

        let mut seen = HashSet::new();
        let mut stones = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| InventoryError::csv(path, e))?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let stone = columns.stone(&record, path)?;
            if !seen.insert(stone.stock_id.clone()) {
                return Err(InventoryError::InvalidRecord {
                    path: path.to_path_buf(),
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    reason: format!("duplicate stock_id '{}'", stone.stock_id),
                });
            }
            stones.push(stone);
        }

        log::debug!("Loaded {} stones from {}", stones.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            attribute_columns: columns.extra_names().map(str::to_string).collect(),
            stones,
        })
    }

    /// Build a catalog from stones already in memory.
    pub fn from_stones(stones: Vec<Stone>) -> Self {
        let attribute_columns: BTreeSet<String> = stones
            .iter()
            .flat_map(|s| s.attributes.keys().cloned())
            .collect();
        Self {
            path: PathBuf::from("<memory>"),
            attribute_columns: attribute_columns.into_iter().collect(),
            stones,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn get(&self, stock_id: &str) -> Option<&Stone> {
        self.stones.iter().find(|s| s.stock_id == stock_id)
    }

    pub fn has_column(&self, column: &str) -> bool {
        STONE_COLUMNS.contains(&column)
            || column == CARAT_ALIAS
            || self.attribute_columns.iter().any(|c| c == column)
    }

    /// Stones matching every predicate of `criteria`, in catalog order.
    pub fn filter(&self, criteria: &Criteria) -> Vec<Stone> {
        self.stones
            .iter()
            .filter(|stone| criteria.matches(stone))
            .cloned()
            .collect()
    }

    /// Fail if `criteria` filters on columns this catalog does not have.
    pub fn check_criteria(&self, criteria: &Criteria) -> Result<()> {
        let missing: Vec<String> = criteria
            .attributes
            .keys()
            .filter(|column| !self.has_column(column))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InventoryError::Schema {
                path: self.path.clone(),
                missing,
            })
        }
    }

    /// Distinct values of `column`, in natural order.
    pub fn unique_values(&self, column: &str) -> Result<Vec<String>> {
        if !self.has_column(column) {
            return Err(InventoryError::Schema {
                path: self.path.clone(),
                missing: vec![column.to_string()],
            });
        }

        let values: BTreeSet<NaturalString> = self
            .stones
            .iter()
            .filter_map(|stone| stone.field(column))
            .filter(|value| !value.is_empty())
            .map(NaturalString::new)
            .collect();
        Ok(values.into_iter().map(NaturalString::into_inner).collect())
    }
}
