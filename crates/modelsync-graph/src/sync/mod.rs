//! Tabular rows to graph model synchronization pipeline.
//!
//! Reconciles the rows against the model, ensures the taxonomy folders,
//! upserts every complete row, then places the resolved nodes in their
//! domain views.

pub mod report;

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use modelsync_core::model::{FieldMap, Folder, MergedRecord};
use modelsync_core::normalize::{check_required_columns, normalize_rows, TabularInput};
use modelsync_core::SyncConfig;

use crate::extract::membership;
use crate::folders::ensure_taxonomy_folders;
use crate::reconcile::{reconcile, ReconcileContext};
use crate::store::ModelStore;
use crate::upsert::{upsert_node, UpsertAction};
use crate::views::sync_views;

pub use report::SyncReport;

/// Merged records and counters from one run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub records: Vec<MergedRecord>,
    pub report: SyncReport,
}

/// Run the full pipeline for one input against `store`.
///
/// Configuration and store-level failures abort the run. A header missing a
/// required column fails every row; per-row validation and mutation
/// failures are counted and logged.
pub fn run_sync<S: ModelStore + ?Sized>(store: &mut S, input: TabularInput, config: &SyncConfig) -> Result<SyncOutcome> {
    let started = Utc::now();
    let mut report = SyncReport::started(started);
    config.validate().context("Invalid configuration")?;

    let header_rows = config.columns.header_rows;
    let headers: Vec<String> = input
        .headers(header_rows)
        .iter()
        .map(|h| config.field_for_column(h).to_string())
        .collect();
    let header_error = if headers.is_empty() {
        None
    } else {
        check_required_columns(&headers, &config.columns.required).err()
    };
    if let Some(e) = &header_error {
        warn!(error = %e, "Input header check failed, rows will not be upserted");
    }
    let rows = normalize_rows(input, header_rows);
    info!(rows = rows.len(), "Starting sync");

    let dynamic = config.columns.synced_at_field.as_ref().map(|field| {
        let mut fields = FieldMap::new();
        fields.insert(field.as_str(), started.to_rfc3339());
        fields
    });

    let mut ctx = ReconcileContext::new();
    let mut reconciled = reconcile(store, &rows, config, &mut ctx, dynamic.as_ref());
    report.rows = reconciled.rows;
    report.graph_only = reconciled.graph_only;

    let folders = ensure_taxonomy_folders(store, config).context("Failed to ensure taxonomy folders")?;
    report.folders_created = folders.created;

    let mut roots: HashMap<String, Option<Folder>> = HashMap::new();
    for record in reconciled.records.iter_mut() {
        let Some(sequence) = record.sequence() else { continue };
        if header_error.is_some() {
            report.failed += 1;
            continue;
        }
        if reconciled.incomplete_rows.contains(&sequence) {
            report.skipped += 1;
            continue;
        }

        let node_type = record.get(&config.columns.type_field).to_string();
        let root_name = config.folders.root_for(&node_type).to_string();
        let root = roots
            .entry(root_name.clone())
            .or_insert_with(|| store.root_folder(&root_name))
            .clone();

        match upsert_node(store, record, root.as_ref(), config) {
            Ok(outcome) => {
                match outcome.action {
                    UpsertAction::Added => report.added += 1,
                    UpsertAction::Updated => report.updated += 1,
                }
                report.property_failures += outcome.property_failures();
                record.set(config.columns.element_id_field.as_str(), outcome.node_id.as_str());
                record.node_id = Some(outcome.node_id);
            }
            Err(e) if e.is_entity_scoped() => {
                warn!(row = sequence, error = %e, "Row failed to upsert");
                report.failed += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("Upsert aborted at row {}", sequence)),
        }
    }

    let views = sync_views(store, &reconciled.records, config, None).context("Failed to synchronize views")?;
    report.views_created = views.views_created;
    report.placements_added = views.placements_added;

    for record in reconciled.records.iter_mut() {
        if let Some(node_id) = record.node_id.clone() {
            let views = membership(store, &node_id, config);
            record.set(config.columns.membership_field.as_str(), views);
        }
    }

    report.finish();
    info!(
        added = report.added,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        folders_created = report.folders_created,
        views_created = report.views_created,
        "Sync complete"
    );

    Ok(SyncOutcome {
        records: reconciled.records,
        report,
    })
}

/// Records for every node in scope, without touching the store.
pub fn export_graph_only<S: ModelStore + ?Sized>(store: &S, config: &SyncConfig) -> Result<Vec<MergedRecord>> {
    config.validate().context("Invalid configuration")?;
    let mut ctx = ReconcileContext::new();
    let reconciled = reconcile(store, &[], config, &mut ctx, None);
    info!(records = reconciled.records.len(), "Exported graph-only records");
    Ok(reconciled.records)
}
