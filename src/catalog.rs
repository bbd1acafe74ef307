//! Machine selector entries derived from the normalized dataset.

use crate::normalizer::LongRecord;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub kod: String,
    pub label: String,
}

impl CatalogEntry {
    fn new(code: &str, name: &str) -> Self {
        let label = if name.trim().is_empty() {
            code.to_string()
        } else {
            format!("{} {}", code, name)
        };
        Self {
            kod: code.to_string(),
            label,
        }
    }
}

/// Distinct (code, name) pairs sorted by code.
///
/// A code recorded under several names yields one entry per name, so data
/// entry inconsistencies stay visible in the selector.
pub fn build_catalog(records: &[LongRecord]) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    let mut pairs: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.code.as_str(), r.name.as_str()))
        .filter(|pair| seen.insert(*pair))
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(b.0));

    pairs
        .into_iter()
        .map(|(code, name)| CatalogEntry::new(code, name))
        .collect()
}

/// Entry preselected when no code was requested.
pub fn default_entry(records: &[LongRecord]) -> Option<CatalogEntry> {
    build_catalog(records).into_iter().next()
}
