//! The read side of a sync: rows and nodes into merged records.
//!
//! Nothing here mutates the store. All per-run state (the matched set and
//! both code caches) lives in a [`ReconcileContext`] owned by the caller.

use std::collections::HashSet;

use tracing::{info, warn};

use modelsync_core::codes::{apply_codes, CodeCache};
use modelsync_core::identity::assign_identities;
use modelsync_core::merge::merge_record;
use modelsync_core::model::{FieldMap, MergedRecord, SourceRow, DESC_MATCH, NAME_MATCH};
use modelsync_core::normalize::missing_required_values;
use modelsync_core::SyncConfig;

use crate::extract::{graph_fields, unmatched_fields};
use crate::matcher::match_row;
use crate::store::ModelStore;
use crate::synth::synthesize_graph_only;

/// Per-invocation state.
#[derive(Debug, Default)]
pub struct ReconcileContext {
    /// Ids of nodes some row matched.
    pub matched: HashSet<String>,
    pub sheet_codes: CodeCache,
    pub model_codes: CodeCache,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Merged records for one run.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Row records in source order, then graph-only records in store order.
    pub records: Vec<MergedRecord>,
    /// Sequence numbers of rows missing a required value.
    pub incomplete_rows: Vec<usize>,
    pub rows: usize,
    pub matched: usize,
    pub graph_only: usize,
}

impl Reconciliation {
    pub fn is_incomplete(&self, sequence: usize) -> bool {
        self.incomplete_rows.contains(&sequence)
    }
}

/// Merge every row with its matched node, synthesize records for the nodes
/// no row matched, then assign reference codes and identities.
pub fn reconcile<S: ModelStore + ?Sized>(
    store: &S,
    rows: &[SourceRow],
    config: &SyncConfig,
    ctx: &mut ReconcileContext,
    dynamic: Option<&FieldMap>,
) -> Reconciliation {
    let mut result = Reconciliation {
        rows: rows.len(),
        ..Default::default()
    };

    let mut sheet_records = Vec::with_capacity(rows.len());
    for row in rows {
        let missing = missing_required_values(row, &config.columns.required);
        if !missing.is_empty() {
            warn!(row = row.sequence, missing = %missing.join(", "), "Row is missing required values");
            result.incomplete_rows.push(row.sequence);
        }

        let outcome = match_row(store, row, config, &mut ctx.matched);
        let graph = match &outcome.node {
            Some(node) => graph_fields(store, node, config),
            None => unmatched_fields(config),
        };

        let mut record = merge_record(config, row, &graph, dynamic);
        record.set_flag(NAME_MATCH, outcome.name_match);
        record.set_flag(DESC_MATCH, outcome.desc_match);
        record.node_id = outcome.node.map(|n| n.id);

        let type_field = config.columns.type_field.as_str();
        if record.get(type_field).trim().is_empty() {
            record.set(type_field, config.elements.default_type.as_str());
        }
        sheet_records.push(record);
    }
    result.matched = sheet_records.iter().filter(|r| r.node_id.is_some()).count();

    apply_codes(&mut sheet_records, &config.codes.sheet, &mut ctx.sheet_codes);

    let graph_only = synthesize_graph_only(store, config, &ctx.matched, &mut ctx.model_codes);
    result.graph_only = graph_only.len();

    result.records = sheet_records;
    result.records.extend(graph_only);
    assign_identities(&mut result.records, &config.identity);

    info!(
        rows = result.rows,
        matched = result.matched,
        graph_only = result.graph_only,
        incomplete = result.incomplete_rows.len(),
        "Reconciled rows against model"
    );
    result
}
