//! Diamond inventory and order management over flat CSV files.
//!
//! The crate owns the reconciliation between three files:
//!
//! * the catalog (`diamonds.csv`), loaded once into a read-only [`Catalog`],
//! * the sold-stones log, an append-only [`SoldSet`] of allocated stock ids,
//! * the order log, an append-only [`OrderLog`] of every stone sold.
//!
//! [`OrderProcessor`] is the only writer of the last two. [`RestockReport`]
//! rebuilds stock-versus-sales figures from the catalog and the order log on
//! demand. Repricing the catalog goes through [`pricing`], gated by an
//! [`Authenticator`].

pub mod analytics;
mod append;
pub mod catalog;
pub mod config;
pub mod criteria;
pub mod error;
pub mod natural_string;
pub mod orders;
pub mod pricing;
pub mod processor;
pub mod restock;
pub mod sold;
pub mod stone;
#[cfg(feature = "table")]
pub mod table;

#[cfg(test)]
mod testing;

pub use analytics::{StoneCount, stone_counts};
pub use catalog::Catalog;
pub use config::Config;
pub use criteria::Criteria;
pub use error::{InventoryError, Result};
pub use orders::{OrderLog, OrderRecord};
pub use pricing::{
    AdjustmentLog, Authenticator, ConfigAuthenticator, Operator, PriceAdjustment, PriceChange,
    adjust_prices,
};
pub use processor::{OrderProcessor, OrderRequest};
pub use restock::{InventoryStatus, RestockReport};
pub use sold::SoldSet;
pub use stone::Stone;
