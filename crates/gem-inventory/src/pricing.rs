//! Manager price adjustments.
//!
//! Repricing rewrites the catalog in place, so it is gated behind an
//! [`Authenticator`]. Every applied adjustment is appended to a plain-text
//! audit log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::ManagerConfig;
use crate::error::{InventoryError, Result};
use crate::stone::PRICE;

/// A manager who passed authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub username: String,
}

/// Decides who may reprice the catalog.
pub trait Authenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<Operator>;
}

/// Checks credentials against the `[[managers]]` table of gem.toml.
#[derive(Debug, Clone, Default)]
pub struct ConfigAuthenticator {
    managers: Vec<ManagerConfig>,
}

impl ConfigAuthenticator {
    pub fn new(managers: Vec<ManagerConfig>) -> Self {
        Self { managers }
    }

    /// Lowercase hex SHA-256 of `password`, the form stored in gem.toml.
    pub fn password_digest(password: &str) -> String {
        format!("{:x}", Sha256::digest(password.as_bytes()))
    }
}

impl Authenticator for ConfigAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<Operator> {
        let digest = Self::password_digest(password);
        let known = self.managers.iter().any(|m| {
            m.username == username && m.password_sha256.trim().eq_ignore_ascii_case(&digest)
        });
        if known {
            log::debug!("Authenticated manager {username}");
            Ok(Operator {
                username: username.to_string(),
            })
        } else {
            Err(InventoryError::AuthenticationFailed {
                username: username.to_string(),
            })
        }
    }
}

/// A requested repricing, before it is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    /// Percentage change; 10 raises prices by 10%, -10 lowers them by 10%
    pub percent: Decimal,
    pub reason: String,
}

impl PriceChange {
    pub fn new(percent: Decimal, reason: impl Into<String>) -> Self {
        Self {
            percent,
            reason: reason.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.percent <= -Decimal::ONE_HUNDRED {
            return Err(InventoryError::Validation(format!(
                "adjustment of {}% would make prices non-positive",
                self.percent
            )));
        }
        if self.reason.trim().is_empty() {
            return Err(InventoryError::Validation(
                "a reason for the adjustment is required".to_string(),
            ));
        }
        Ok(())
    }

    fn factor(&self) -> Decimal {
        Decimal::ONE + self.percent / Decimal::ONE_HUNDRED
    }

    /// New price, rounded to cents.
    pub fn apply(&self, price: Decimal) -> Decimal {
        let mut adjusted = (price * self.factor()).round_dp(2);
        adjusted.rescale(2);
        adjusted
    }
}

/// An adjustment that has been written to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAdjustment {
    pub percent: Decimal,
    pub reason: String,
    pub operator: String,
    pub applied_at: DateTime<Utc>,
    pub stones_repriced: usize,
}

impl PriceAdjustment {
    /// One audit-log line.
    pub fn log_line(&self) -> String {
        format!(
            "{} | Adjustment: {}% | Reason: {} | Operator: {}",
            self.applied_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.percent,
            self.reason.trim(),
            self.operator
        )
    }
}

/// Reprice every stone in the catalog CSV at `path`.
///
/// Only `total_sales_price` changes; every other column and the column order
/// are kept. The file is replaced atomically.
pub fn adjust_prices(
    path: &Path,
    change: &PriceChange,
    operator: &Operator,
) -> Result<PriceAdjustment> {
    change.validate()?;
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
    let price_column = headers
        .iter()
        .position(|h| h.trim() == PRICE)
        .ok_or_else(|| InventoryError::Schema {
            path: path.to_path_buf(),
            missing: vec![PRICE.to_string()],
        })?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&headers)
        .map_err(|e| InventoryError::csv(path, e))?;

    let mut repriced = 0;
    for result in reader.records() {
        let record = result.map_err(|e| InventoryError::csv(path, e))?;
        let raw = record.get(price_column).unwrap_or("").trim();
        let price = Decimal::from_str(raw).map_err(|_| InventoryError::InvalidRecord {
            path: path.to_path_buf(),
            line: record.position().map(|p| p.line()).unwrap_or_default(),
            reason: format!("{PRICE} '{raw}' is not a number"),
        })?;

        let adjusted = change.apply(price).to_string();
        let fields = record
            .iter()
            .enumerate()
            .map(|(i, field)| if i == price_column { adjusted.as_str() } else { field });
        writer
            .write_record(fields)
            .map_err(|e| InventoryError::csv(path, e))?;
        repriced += 1;
    }

    let contents = writer
        .into_inner()
        .map_err(|e| InventoryError::io(path, e.into_error()))?;
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            f.write_all(&contents)?;
            f.flush()
        })
        .map_err(|err| InventoryError::io(path, std::io::Error::other(err.to_string())))?;

    log::info!(
        "{} repriced {} stones by {}% in {}",
        operator.username,
        repriced,
        change.percent,
        path.display()
    );

    Ok(PriceAdjustment {
        percent: change.percent,
        reason: change.reason.trim().to_string(),
        operator: operator.username.clone(),
        applied_at: Utc::now(),
        stones_repriced: repriced,
    })
}

/// Append-only text log of applied price adjustments.
#[derive(Debug, Clone)]
pub struct AdjustmentLog {
    path: PathBuf,
}

impl AdjustmentLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, adjustment: &PriceAdjustment) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| InventoryError::io(&self.path, e))?;
        writeln!(file, "{}", adjustment.log_line()).map_err(|e| InventoryError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::testing::{write_catalog, SAMPLE_CATALOG};
    use rust_decimal_macros::dec;

    fn authenticator() -> ConfigAuthenticator {
        ConfigAuthenticator::new(vec![ManagerConfig {
            username: "ops".to_string(),
            password_sha256: ConfigAuthenticator::password_digest("s3cret"),
        }])
    }

    fn operator() -> Operator {
        Operator {
            username: "ops".to_string(),
        }
    }

    #[test]
    fn test_password_digest_is_sha256_hex() {
        assert_eq!(
            ConfigAuthenticator::password_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_authenticate() {
        let auth = authenticator();
        assert_eq!(auth.authenticate("ops", "s3cret").unwrap(), operator());
        assert!(matches!(
            auth.authenticate("ops", "wrong").unwrap_err(),
            InventoryError::AuthenticationFailed { .. }
        ));
        assert!(auth.authenticate("someone", "s3cret").is_err());
        assert!(ConfigAuthenticator::default()
            .authenticate("ops", "s3cret")
            .is_err());
    }

    #[test]
    fn test_apply_rounds_to_cents() {
        let raise = PriceChange::new(dec!(10), "market");
        assert_eq!(raise.apply(dec!(100)).to_string(), "110.00");
        assert_eq!(raise.apply(dec!(5500.50)).to_string(), "6050.55");

        let cut = PriceChange::new(dec!(-12.5), "clearance");
        assert_eq!(cut.apply(dec!(3000.00)).to_string(), "2625.00");
    }

    #[test]
    fn test_validate_change() {
        assert!(PriceChange::new(dec!(-100), "free").validate().is_err());
        assert!(PriceChange::new(dec!(5), "  ").validate().is_err());
        assert!(PriceChange::new(dec!(-99.9), "sale").validate().is_ok());
    }

    #[test]
    fn test_adjust_prices_rewrites_only_price_column() {
        let (_dir, path) = write_catalog(SAMPLE_CATALOG);
        let before = Catalog::load(&path).unwrap();

        let adjustment =
            adjust_prices(&path, &PriceChange::new(dec!(10), "market"), &operator()).unwrap();
        assert_eq!(adjustment.stones_repriced, 6);
        assert_eq!(adjustment.operator, "ops");

        let after = Catalog::load(&path).unwrap();
        assert_eq!(after.len(), before.len());
        for (old, new) in before.stones().iter().zip(after.stones()) {
            assert_eq!(new.price, (old.price * dec!(1.1)).round_dp(2));
            assert_eq!(new.stock_id, old.stock_id);
            assert_eq!(new.carat, old.carat);
            assert_eq!(new.attributes, old.attributes);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(
            "stock_id,cut,carat,clarity,cut_quality,lab,total_sales_price,color\n\
             R1,Round,1.00,VS1,Excellent,GIA,5500.00,E\n"
        ));
    }

    #[test]
    fn test_invalid_change_leaves_catalog_untouched() {
        let (_dir, path) = write_catalog(SAMPLE_CATALOG);
        let err = adjust_prices(&path, &PriceChange::new(dec!(-150), "oops"), &operator())
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE_CATALOG);
    }

    #[test]
    fn test_missing_price_column() {
        let (_dir, path) = write_catalog("stock_id,cut\nS1,Round\n");
        let err = adjust_prices(&path, &PriceChange::new(dec!(1), "x"), &operator()).unwrap_err();
        assert!(err.to_string().contains("total_sales_price"));
    }

    #[test]
    fn test_adjustment_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AdjustmentLog::new(dir.path().join("adjustment_log.txt"));
        let adjustment = PriceAdjustment {
            percent: dec!(10),
            reason: "market".to_string(),
            operator: "ops".to_string(),
            applied_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
            stones_repriced: 6,
        };
        log.append(&adjustment).unwrap();
        log.append(&adjustment).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let line = "2026-01-02T03:04:05Z | Adjustment: 10% | Reason: market | Operator: ops\n";
        assert_eq!(contents, format!("{line}{line}"));
    }
}
