use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::stone::Stone;

/// Number of stones of one shape at one carat weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoneCount {
    pub cut: String,
    pub carat: Decimal,
    pub stone_count: usize,
}

/// Count stones per (cut, carat), optionally for a single cut.
///
/// Sorted by cut, then by carat ascending. The cut filter ignores case.
pub fn stone_counts(stones: &[Stone], cut: Option<&str>) -> Vec<StoneCount> {
    let wanted = cut.map(|c| c.trim().to_lowercase());
    let mut counts: BTreeMap<(&str, Decimal), usize> = BTreeMap::new();
    for stone in stones {
        if wanted
            .as_deref()
            .is_some_and(|w| stone.cut.trim().to_lowercase() != w)
        {
            continue;
        }
        *counts
            .entry((stone.cut.as_str(), stone.carat.normalize()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((cut, carat), stone_count)| StoneCount {
            cut: cut.to_string(),
            carat,
            stone_count,
        })
        .collect()
}
