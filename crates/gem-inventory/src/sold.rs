use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::append::open_log;
use crate::error::{InventoryError, Result};
use crate::stone::{STOCK_ID, Stone};

/// Durable set of stock ids already allocated to orders.
///
/// Backed by an append-only CSV with a single `stock_id` column. The set only
/// ever grows.
#[derive(Debug, Clone)]
pub struct SoldSet {
    path: PathBuf,
    ids: HashSet<String>,
}

impl SoldSet {
    /// Load the sold-stones log, or start empty if it does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let ids = read_ids(path)?;
        log::debug!("Loaded {} sold stones from {}", ids.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the log, picking up ids appended by other processes.
    pub fn reload(&mut self) -> Result<()> {
        self.ids = read_ids(&self.path)?;
        Ok(())
    }

    pub fn contains(&self, stock_id: &str) -> bool {
        self.ids.contains(stock_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Drop already-sold stones, keeping the order of the rest.
    pub fn exclude(&self, stones: Vec<Stone>) -> Vec<Stone> {
        stones
            .into_iter()
            .filter(|stone| !self.contains(&stone.stock_id))
            .collect()
    }

    /// Append `ids` to the log, then record them in memory.
    pub fn add_all<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(());
        }

        let path = &self.path;
        let target = open_log(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(target.file);
        if target.header.is_none() {
            writer
                .write_record([STOCK_ID])
                .map_err(|e| InventoryError::csv(path, e))?;
        }
        for id in &ids {
            writer
                .write_record([id])
                .map_err(|e| InventoryError::csv(path, e))?;
        }
        writer.flush().map_err(|e| InventoryError::io(path, e))?;

        log::debug!("Appended {} ids to {}", ids.len(), path.display());
        self.ids.extend(ids);
        Ok(())
    }
}

fn read_ids(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| InventoryError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| InventoryError::csv(path, e))?;
    if headers.is_empty() {
        return Ok(HashSet::new());
    }
    let column = headers
        .iter()
        .position(|h| h.trim() == STOCK_ID)
        .ok_or_else(|| InventoryError::Schema {
            path: path.to_path_buf(),
            missing: vec![STOCK_ID.to_string()],
        })?;

    let mut ids = HashSet::new();
    for result in reader.records() {
        let record = result.map_err(|e| InventoryError::csv(path, e))?;
        if let Some(id) = record.get(column).map(str::trim).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::criteria::Criteria;
    use crate::testing::{write_catalog, SAMPLE_CATALOG};

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sold = SoldSet::load(&dir.path().join("sold_stones.csv")).unwrap();
        assert!(sold.is_empty());
        assert!(!sold.contains("R1"));
    }

    #[test]
    fn test_add_all_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sold_stones.csv");

        let mut sold = SoldSet::load(&path).unwrap();
        sold.add_all(["R1", "R2"]).unwrap();
        sold.add_all(vec!["O1".to_string()]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "stock_id\nR1\nR2\nO1\n");

        let reloaded = SoldSet::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert!(reloaded.contains("O1"));
    }

    #[test]
    fn test_add_nothing_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sold_stones.csv");
        let mut sold = SoldSet::load(&path).unwrap();
        sold.add_all(Vec::<String>::new()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_excluded_after_add() {
        let (dir, catalog_path) = write_catalog(SAMPLE_CATALOG);
        let catalog = Catalog::load(&catalog_path).unwrap();
        let mut sold = SoldSet::load(&dir.path().join("sold_stones.csv")).unwrap();

        let round = Criteria::new().cut("Round");
        assert_eq!(sold.exclude(catalog.filter(&round)).len(), 3);

        sold.add_all(["R1", "R3"]).unwrap();
        let remaining = sold.exclude(catalog.filter(&round));
        let ids: Vec<&str> = remaining.iter().map(|s| s.stock_id.as_str()).collect();
        assert_eq!(ids, vec!["R2"]);

        // excluding twice changes nothing
        assert_eq!(sold.exclude(remaining.clone()), remaining);
    }

    #[test]
    fn test_wrong_header_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sold_stones.csv");
        std::fs::write(&path, "id\nR1\n").unwrap();
        let err = SoldSet::load(&path).unwrap_err();
        assert!(matches!(err, InventoryError::Schema { .. }));
    }

    #[test]
    fn test_add_after_unterminated_line_keeps_both_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sold_stones.csv");
        std::fs::write(&path, "stock_id\nR1").unwrap();

        let mut sold = SoldSet::load(&path).unwrap();
        sold.add_all(["R2"]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "stock_id\nR1\nR2\n");

        let reloaded = SoldSet::load(&path).unwrap();
        assert!(reloaded.contains("R1"));
        assert!(reloaded.contains("R2"));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_reload_sees_external_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sold_stones.csv");
        let mut first = SoldSet::load(&path).unwrap();
        let mut second = SoldSet::load(&path).unwrap();

        second.add_all(["P1"]).unwrap();
        assert!(!first.contains("P1"));
        first.reload().unwrap();
        assert!(first.contains("P1"));
    }
}
