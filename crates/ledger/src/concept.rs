//! Concept code resolution and the display-name registry.
//!
//! Collection and accounting keys are compound codes of the form
//! `YEAR.CONCEPT[.SUFFIX...]` (slashes are accepted as separators too). The
//! concept code is the second segment; the year is the first.

use std::collections::BTreeMap;

use crate::model::TributeRecord;

/// Code assigned to keys that carry no usable concept segment.
pub const UNRESOLVED_CONCEPT: &str = "unresolved";

fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split(['.', '/']).map(str::trim)
}

/// Canonical concept code for a collection key. Never fails.
pub fn resolve_code(collection_key: &str) -> String {
    match segments(collection_key).nth(1) {
        Some(code) if !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric()) => {
            code.to_string()
        }
        _ => UNRESOLVED_CONCEPT.to_string(),
    }
}

/// Leading segment of a key, untouched.
pub fn raw_year_segment(key: &str) -> &str {
    segments(key).next().unwrap_or("")
}

/// Leading segment parsed as a year, if it is an integer.
pub fn year_segment(key: &str) -> Option<i32> {
    let raw = raw_year_segment(key);
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Display names per concept code, filled once before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptRegistry {
    names: BTreeMap<String, String>,
}

impl ConceptRegistry {
    /// Seed with configured names, then back-fill any code without one from the
    /// first non-empty concept description seen for it.
    pub fn observe<'a>(
        configured: &BTreeMap<String, String>,
        records: impl IntoIterator<Item = &'a TributeRecord>,
    ) -> Self {
        let mut names = configured.clone();
        for record in records {
            let description = record.concept.trim();
            if description.is_empty() {
                continue;
            }
            names
                .entry(resolve_code(&record.collection_key))
                .or_insert_with(|| description.to_string());
        }
        Self { names }
    }

    pub fn resolve_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.names.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
