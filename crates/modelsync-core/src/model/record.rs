//! Source rows and merged output records.

use std::collections::BTreeMap;

use serde::Serialize;

use super::fields::FieldMap;

/// Provenance flag: the row's name matched a node.
pub const NAME_MATCH: &str = "nameMatch";
/// Provenance flag: the row's description matched the node's documentation.
pub const DESC_MATCH: &str = "descMatch";
/// Provenance flag: the record was synthesized from a node with no row.
pub const MODEL_ONLY: &str = "modelOnly";

pub const PROVENANCE_FLAGS: [&str; 3] = [NAME_MATCH, DESC_MATCH, MODEL_ONLY];

/// A normalized tabular row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRow {
    pub fields: FieldMap,
    /// 1-based position in the source.
    pub sequence: usize,
}

impl SourceRow {
    pub fn new(fields: FieldMap, sequence: usize) -> Self {
        Self { fields, sequence }
    }
}

/// Where a merged record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// Built from the source row with this sequence number.
    Row(usize),
    /// Synthesized from a node no row matched.
    ModelOnly,
}

/// The unified output row for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRecord {
    pub fields: BTreeMap<String, String>,
    pub origin: RecordOrigin,
    /// Node this record resolved to, once matched or upserted.
    pub node_id: Option<String>,
}

impl MergedRecord {
    /// A record with every recognized field set to the empty string and all
    /// provenance flags `"0"`.
    pub fn blank<'a>(recognized: impl IntoIterator<Item = &'a str>, origin: RecordOrigin) -> Self {
        let mut fields: BTreeMap<String, String> = recognized
            .into_iter()
            .map(|f| (f.to_string(), String::new()))
            .collect();
        for flag in PROVENANCE_FLAGS {
            fields.insert(flag.to_string(), "0".to_string());
        }
        if origin == RecordOrigin::ModelOnly {
            fields.insert(MODEL_ONLY.to_string(), "1".to_string());
        }
        Self {
            fields,
            origin,
            node_id: None,
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn set_flag(&mut self, flag: &str, on: bool) {
        self.fields
            .insert(flag.to_string(), if on { "1" } else { "0" }.to_string());
    }

    pub fn flag(&self, flag: &str) -> bool {
        self.get(flag) == "1"
    }

    pub fn is_model_only(&self) -> bool {
        self.origin == RecordOrigin::ModelOnly
    }

    pub fn sequence(&self) -> Option<usize> {
        match self.origin {
            RecordOrigin::Row(seq) => Some(seq),
            RecordOrigin::ModelOnly => None,
        }
    }

    /// Short label for log lines: the row number or the node id.
    pub fn label(&self) -> String {
        match (self.origin, &self.node_id) {
            (RecordOrigin::Row(seq), _) => format!("row {}", seq),
            (RecordOrigin::ModelOnly, Some(id)) => format!("node {}", id),
            (RecordOrigin::ModelOnly, None) => "model-only record".to_string(),
        }
    }
}
