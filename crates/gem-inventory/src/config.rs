use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// Default low-stock threshold used by the restock report.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// File name looked up in the working directory when no config path is given.
pub const CONFIG_FILE_NAME: &str = "gem.toml";

/// Top-level gem.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub restock: RestockConfig,
    pub orders: OrdersConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managers: Vec<ManagerConfig>,
}

/// Locations of every data file. Relative paths are resolved against the
/// directory holding gem.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub catalog: PathBuf,
    pub sold_stones: PathBuf,
    pub orders: PathBuf,
    pub restock_report: PathBuf,
    pub adjustment_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("diamonds.csv"),
            sold_stones: PathBuf::from("sold_stones.csv"),
            orders: PathBuf::from("order_details.csv"),
            restock_report: PathBuf::from("inventory_status.csv"),
            adjustment_log: PathBuf::from("adjustment_log.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestockConfig {
    pub low_stock_threshold: i64,
}

impl Default for RestockConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrdersConfig {
    /// Hold an advisory lock next to the sold-stones log while placing an
    /// order. Without it, concurrent `gem order` runs can sell the same stone.
    pub lock: bool,
}

/// A manager allowed to reprice the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    pub username: String,
    /// Lowercase hex SHA-256 digest of the password
    pub password_sha256: String,
}

impl Config {
    /// Parse from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| InventoryError::Validation(format!("failed to parse gem.toml: {e}")))
    }

    /// Load `path` and resolve relative data paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InventoryError::DataUnavailable {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| InventoryError::io(path, e))?;
        let config = Self::parse(&content)?;
        log::debug!("Loaded configuration from {}", path.display());

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_paths(base))
    }

    /// Load an explicit config if given, else `./gem.toml` if present, else defaults
    /// rooted at `cwd`.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            log::debug!("No {CONFIG_FILE_NAME} found, using defaults");
            Ok(Self::default().resolve_paths(cwd))
        }
    }

    /// Make every relative data path absolute against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let p = &mut self.paths;
        for path in [
            &mut p.catalog,
            &mut p.sold_stones,
            &mut p.orders,
            &mut p.restock_report,
            &mut p.adjustment_log,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Lock file guarding the sold-stones log when `orders.lock` is set.
    pub fn order_lock_path(&self) -> PathBuf {
        self.paths.sold_stones.with_extension("lock")
    }
}
