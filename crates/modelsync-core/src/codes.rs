//! Reference code generation.
//!
//! Each distinct source value gets a short abbreviation: the first three
//! characters of a single word, or one initial per word. Values that end up
//! sharing a code are upgraded once to two characters per word. The upgrade
//! is a single pass; a collision it introduces itself is left as is.
//!
//! Codes are then combined with a reference value into a display string.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::config::CodeMapping;
use crate::model::{normalize_name, MergedRecord};

/// Source value to code map for one column signature.
#[derive(Debug, Clone, Default)]
pub struct CodeCache {
    signature: Option<String>,
    codes: HashMap<String, String>,
    counts: HashMap<String, usize>,
}

impl CodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self, value: &str) -> Option<&str> {
        self.codes.get(value).map(String::as_str)
    }

    /// How many distinct source values currently map to `code`.
    pub fn share_count(&self, code: &str) -> usize {
        self.counts.get(code).copied().unwrap_or(0)
    }

    /// Make sure the cache covers `values` under `mapping`.
    ///
    /// The existing map is reused when the signature is unchanged and every
    /// value is already known; otherwise it is rebuilt. Returns whether a
    /// rebuild happened.
    pub fn ensure<'a>(&mut self, mapping: &CodeMapping, values: impl IntoIterator<Item = &'a str>) -> bool {
        let signature = mapping.signature();
        let distinct: BTreeSet<&str> = values
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();

        let reusable = self.signature.as_deref() == Some(signature.as_str())
            && distinct.iter().all(|v| self.codes.contains_key(*v));
        if reusable {
            return false;
        }

        self.build(signature, distinct);
        true
    }

    fn build(&mut self, signature: String, distinct: BTreeSet<&str>) {
        self.codes = distinct
            .iter()
            .map(|v| (v.to_string(), initial_code(v)))
            .collect();
        self.recount();

        let colliding: Vec<String> = self
            .codes
            .iter()
            .filter(|(_, code)| self.share_count(code) > 1)
            .map(|(value, _)| value.clone())
            .collect();
        for value in &colliding {
            let upgraded = upgraded_code(value);
            debug!(value = %value, code = %upgraded, "Upgraded colliding reference code");
            self.codes.insert(value.clone(), upgraded);
        }
        self.recount();

        debug!(signature = %signature, values = self.codes.len(), upgraded = colliding.len(), "Built reference code cache");
        self.signature = Some(signature);
    }

    fn recount(&mut self) {
        self.counts.clear();
        for code in self.codes.values() {
            *self.counts.entry(code.clone()).or_insert(0) += 1;
        }
    }
}

/// First three characters of a single word, or one initial per word.
pub fn initial_code(value: &str) -> String {
    let words: Vec<&str> = value.split_whitespace().collect();
    match words.as_slice() {
        [] => String::new(),
        [word] => word.chars().take(3).collect(),
        many => many.iter().filter_map(|w| w.chars().next()).collect(),
    }
}

/// Two characters per word; single-letter words contribute their one letter.
pub fn upgraded_code(value: &str) -> String {
    value
        .split_whitespace()
        .flat_map(|w| w.chars().take(2))
        .collect()
}

/// Combine a source value's code with its reference value.
pub fn combine(source: &str, code: &str, reference: &str) -> String {
    if source.to_lowercase() == reference.to_lowercase() {
        return reference.to_string();
    }
    match (code.is_empty(), reference.is_empty()) {
        (true, true) => String::new(),
        (false, true) => code.to_string(),
        (true, false) => reference.to_string(),
        (false, false) if normalize_name(code) == normalize_name(reference) => reference.to_string(),
        (false, false) => format!("{}-{}", code, reference),
    }
}

/// First non-empty value among the reference columns.
pub fn reference_value<'a>(record: &'a MergedRecord, mapping: &CodeMapping) -> &'a str {
    mapping
        .references
        .iter()
        .map(|col| record.get(col))
        .find(|v| !v.trim().is_empty())
        .unwrap_or("")
}

/// Fill `mapping.output` on every record from its source code and reference.
pub fn apply_codes(records: &mut [MergedRecord], mapping: &CodeMapping, cache: &mut CodeCache) {
    cache.ensure(mapping, records.iter().map(|r| r.get(&mapping.source)));

    for record in records.iter_mut() {
        let source = record.get(&mapping.source).to_string();
        let code = cache.code(&source).unwrap_or("").to_string();
        let reference = reference_value(record, mapping).to_string();
        let display = combine(&source, &code, &reference);
        record.set(mapping.output.as_str(), display);
    }
}
