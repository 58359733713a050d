//! Per-domain heat-map views.
//!
//! One view per distinct domain label, named `"{domain} {suffix}"`. Every
//! resolved node is placed once in its domain's view and each view is then
//! laid out on a square-ish grid.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use modelsync_core::model::{Bounds, MergedRecord, View, ViewChild};
use modelsync_core::{SyncConfig, SyncResult};

use crate::store::ModelStore;

/// Called for records whose node is already placed in its view.
pub type PlacementHook<'a> = dyn FnMut(&ViewChild, &MergedRecord) + 'a;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSyncOutcome {
    pub views_created: usize,
    pub views_reused: usize,
    pub placements_added: usize,
    pub placements_skipped: usize,
    pub placements_failed: usize,
}

/// Diagram-safe form of a domain label: control and path characters dropped,
/// whitespace collapsed. Empty input gives `root_label`.
pub fn sanitize_label(label: &str, root_label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                ' '
            } else {
                c
            }
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        root_label.to_string()
    } else {
        collapsed
    }
}

pub fn view_name(domain: &str, suffix: &str) -> String {
    format!("{} {}", domain, suffix)
}

/// Grid width for `n` placements: the integer ceiling of its square root.
pub fn grid_columns(n: usize) -> usize {
    let mut columns = 0;
    while columns * columns < n {
        columns += 1;
    }
    columns
}

/// Top-left corner of placement `index`.
pub fn grid_position(index: usize, columns: usize, cell_width: i32, cell_height: i32) -> (i32, i32) {
    let columns = columns.max(1);
    let col = (index % columns) as i32;
    let row = (index / columns) as i32;
    (col * cell_width, row * cell_height)
}

/// Find the view named exactly `name`, creating it if absent.
fn ensure_view<S: ModelStore + ?Sized>(store: &mut S, name: &str) -> SyncResult<(View, bool)> {
    if let Some(existing) = store.find_views(name).into_iter().next() {
        return Ok((existing, false));
    }
    let view = store
        .create_view(name)
        .map_err(|e| e.for_entity(format!("view {}", name)))?;
    debug!(view_id = %view.id, name, "Created view");
    Ok((view, true))
}

/// Lay out the geometric children of a view on a grid, keeping their sizes.
/// Returns how many were moved.
pub fn arrange_view<S: ModelStore + ?Sized>(store: &mut S, view_id: &str, config: &SyncConfig) -> usize {
    let placements: Vec<ViewChild> = store
        .view_children(view_id)
        .into_iter()
        .filter(ViewChild::is_geometric)
        .collect();
    let columns = grid_columns(placements.len());

    let mut moved = 0;
    for (index, child) in placements.iter().enumerate() {
        let Some(current) = child.bounds else { continue };
        let (x, y) = grid_position(index, columns, config.views.cell_width, config.views.cell_height);
        if current.x == x && current.y == y {
            continue;
        }
        let bounds = Bounds::new(x, y, current.width, current.height);
        match store.set_bounds(view_id, &child.id, bounds) {
            Ok(()) => moved += 1,
            Err(e) => warn!(view_id, child_id = %child.id, error = %e, "Failed to move placement"),
        }
    }
    moved
}

/// Find-or-create the domain views, place every resolved node, then arrange.
///
/// Records without a node id are ignored. A failed placement is logged and
/// counted; a failed view creation aborts.
pub fn sync_views<S: ModelStore + ?Sized>(
    store: &mut S,
    records: &[MergedRecord],
    config: &SyncConfig,
    mut hook: Option<&mut PlacementHook<'_>>,
) -> SyncResult<ViewSyncOutcome> {
    let views = &config.views;
    let mut outcome = ViewSyncOutcome::default();
    let mut by_label: HashMap<String, View> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for record in records {
        let Some(node_id) = record.node_id.as_deref() else { continue };
        let label = sanitize_label(record.get(&views.domain_field), &views.root_label);

        if !by_label.contains_key(&label) {
            let (view, created) = ensure_view(store, &view_name(&label, &views.suffix))?;
            if created {
                outcome.views_created += 1;
            } else {
                outcome.views_reused += 1;
            }
            order.push(label.clone());
            by_label.insert(label.clone(), view);
        }
        let Some(view) = by_label.get(&label) else { continue };

        let existing = store
            .view_children(&view.id)
            .into_iter()
            .find(|c| c.node_id.as_deref() == Some(node_id));
        match existing {
            Some(child) => {
                outcome.placements_skipped += 1;
                if let Some(hook) = hook.as_mut() {
                    hook(&child, record);
                }
            }
            None => match store.add_to_view(&view.id, node_id, views.placeholder) {
                Ok(child) => {
                    debug!(view = %view.name, node_id, child_id = %child.id, "Placed node");
                    outcome.placements_added += 1;
                }
                Err(e) => {
                    warn!(view = %view.name, node_id, error = %e, "Failed to place node");
                    outcome.placements_failed += 1;
                }
            },
        }
    }

    for label in &order {
        if let Some(view) = by_label.get(label) {
            let moved = arrange_view(store, &view.id, config);
            debug!(view = %view.name, moved, "Arranged view");
        }
    }

    info!(
        views_created = outcome.views_created,
        placements_added = outcome.placements_added,
        placements_skipped = outcome.placements_skipped,
        "Views synchronized"
    );
    Ok(outcome)
}
