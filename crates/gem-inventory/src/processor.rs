use std::path::PathBuf;

use fslock::LockFile;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::criteria::Criteria;
use crate::error::{InventoryError, Result};
use crate::orders::{OrderLog, OrderRecord};
use crate::sold::SoldSet;
use crate::stone::Stone;

/// What a customer asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub criteria: Criteria,
    pub customer_name: String,
    /// Signed so that nonsense input reaches validation instead of a parse error
    pub quantity: i64,
}

impl OrderRequest {
    pub fn new(criteria: Criteria, customer_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            criteria,
            customer_name: customer_name.into(),
            quantity,
        }
    }

    /// Check the request and return the quantity as a count of stones.
    pub fn validate(&self) -> Result<usize> {
        if self.customer_name.trim().is_empty() {
            return Err(InventoryError::Validation(
                "customer name must not be empty".to_string(),
            ));
        }
        if self.quantity <= 0 {
            return Err(InventoryError::Validation(format!(
                "number of stones must be positive, got {}",
                self.quantity
            )));
        }
        self.criteria.validate()?;
        usize::try_from(self.quantity)
            .map_err(|_| InventoryError::Validation(format!("too many stones: {}", self.quantity)))
    }
}

/// Allocates unsold catalog stones to customers.
///
/// The sold set is appended before the order log. A crash between the two
/// writes leaves stones marked sold without an order row, never the reverse.
/// Concurrent processors over the same files are only safe with a lock
/// (see [`OrderProcessor::with_lock`]).
pub struct OrderProcessor<'a> {
    catalog: &'a Catalog,
    sold: SoldSet,
    log: OrderLog,
    lock_path: Option<PathBuf>,
}

impl<'a> OrderProcessor<'a> {
    pub fn new(catalog: &'a Catalog, sold: SoldSet, log: OrderLog) -> Self {
        Self {
            catalog,
            sold,
            log,
            lock_path: None,
        }
    }

    /// Serialise order placement across processes with an advisory lock file.
    pub fn with_lock(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn sold(&self) -> &SoldSet {
        &self.sold
    }

    pub fn order_log(&self) -> &OrderLog {
        &self.log
    }

    /// Unsold stones matching `criteria`, in catalog order. Writes nothing.
    pub fn available(&self, criteria: &Criteria) -> Result<Vec<Stone>> {
        criteria.validate()?;
        self.catalog.check_criteria(criteria)?;
        Ok(self.sold.exclude(self.catalog.filter(criteria)))
    }

    /// Allocate the first `quantity` available stones to the customer.
    ///
    /// Either both the sold set and the order log are appended and the record
    /// is returned, or a precondition fails and nothing is written.
    pub fn place_order(&mut self, request: &OrderRequest) -> Result<OrderRecord> {
        let quantity = request.validate()?;

        let lock = self.acquire_lock()?;
        if lock.is_some() {
            self.sold.reload()?;
        }

        let available = self.available(&request.criteria)?;
        if quantity > available.len() {
            log::debug!(
                "Rejecting order for {}: {} requested, {} available",
                request.customer_name,
                quantity,
                available.len()
            );
            return Err(InventoryError::InsufficientStock {
                requested: quantity,
                available: available.len(),
            });
        }

        let selected: Vec<Stone> = available.into_iter().take(quantity).collect();
        let record = OrderRecord::new(request.customer_name.trim(), selected);

        self.sold
            .add_all(record.stones.iter().map(|s| s.stock_id.clone()))?;
        self.log.append(&record)?;

        log::info!(
            "Placed order for {}: {} stones, {} ct, {}",
            record.customer_name,
            record.quantity(),
            record.total_carat,
            record.total_price
        );
        Ok(record)
    }

    fn acquire_lock(&self) -> Result<Option<LockFile>> {
        let Some(path) = &self.lock_path else {
            return Ok(None);
        };
        let lock_err = |source| InventoryError::Lock {
            path: path.clone(),
            source,
        };
        let mut lock = LockFile::open(path).map_err(lock_err)?;
        lock.lock().map_err(lock_err)?;
        log::debug!("Acquired order lock {}", path.display());
        Ok(Some(lock))
    }
}
