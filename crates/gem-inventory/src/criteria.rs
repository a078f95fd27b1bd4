use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};
use crate::stone::Stone;

/// Conjunctive filter over stone attributes.
///
/// Text fields compare case-insensitively after trimming; the carat range is
/// inclusive on both ends. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carat_min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carat_max: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cut_quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,
    /// Equality on extra catalog columns such as `color` or `polish`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cut(mut self, cut: impl Into<String>) -> Self {
        self.cut = Some(cut.into());
        self
    }

    pub fn carat_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.carat_min = min;
        self.carat_max = max;
        self
    }

    pub fn clarity(mut self, clarity: impl Into<String>) -> Self {
        self.clarity = Some(clarity.into());
        self
    }

    pub fn cut_quality(mut self, cut_quality: impl Into<String>) -> Self {
        self.cut_quality = Some(cut_quality.into());
        self
    }

    pub fn lab(mut self, lab: impl Into<String>) -> Self {
        self.lab = Some(lab.into());
        self
    }

    pub fn attribute(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject malformed criteria before any stone is examined.
    pub fn validate(&self) -> Result<()> {
        let text_fields = [
            ("cut", &self.cut),
            ("clarity", &self.clarity),
            ("cut_quality", &self.cut_quality),
            ("lab", &self.lab),
        ];
        for (name, value) in text_fields {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(InventoryError::Validation(format!("{name} must not be empty")));
            }
        }

        for (name, bound) in [("carat_min", self.carat_min), ("carat_max", self.carat_max)] {
            if bound.is_some_and(|b| b < Decimal::ZERO) {
                return Err(InventoryError::Validation(format!(
                    "{name} must not be negative"
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.carat_min, self.carat_max) {
            if min > max {
                return Err(InventoryError::Validation(format!(
                    "carat min ({min}) cannot be greater than carat max ({max})"
                )));
            }
        }

        if self.attributes.keys().any(|k| k.trim().is_empty()) {
            return Err(InventoryError::Validation(
                "attribute filters need a column name".to_string(),
            ));
        }

        Ok(())
    }

    pub fn matches(&self, stone: &Stone) -> bool {
        text_matches(&self.cut, &stone.cut)
            && text_matches(&self.clarity, &stone.clarity)
            && text_matches(&self.cut_quality, &stone.cut_quality)
            && text_matches(&self.lab, &stone.lab)
            && self.carat_min.is_none_or(|min| stone.carat >= min)
            && self.carat_max.is_none_or(|max| stone.carat <= max)
            && self.attributes.iter().all(|(column, wanted)| {
                stone
                    .attributes
                    .get(column)
                    .is_some_and(|actual| same_text(actual, wanted))
            })
    }
}

fn text_matches(wanted: &Option<String>, actual: &str) -> bool {
    wanted.as_deref().is_none_or(|w| same_text(w, actual))
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
