//! Row to node matching by normalized name.

use std::collections::HashSet;

use tracing::debug;

use modelsync_core::merge::row_field;
use modelsync_core::model::{normalize_name, GraphNode, SourceRow};
use modelsync_core::SyncConfig;

use crate::store::ModelStore;

/// Result of matching one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub node: Option<GraphNode>,
    pub name_match: bool,
    pub desc_match: bool,
}

/// First node of any type whose normalized name equals `name`.
pub fn find_by_name<S: ModelStore + ?Sized>(store: &S, name: &str) -> Option<GraphNode> {
    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return None;
    }
    store
        .find_nodes(&|n| normalize_name(&n.name) == wanted)
        .into_iter()
        .next()
}

/// Match a row against the store and record the hit in `matched`.
pub fn match_row<S: ModelStore + ?Sized>(
    store: &S,
    row: &SourceRow,
    config: &SyncConfig,
    matched: &mut HashSet<String>,
) -> MatchOutcome {
    let name = row_field(config, row, &config.columns.name_field).unwrap_or("");
    let Some(node) = find_by_name(store, name) else {
        debug!(row = row.sequence, name, "No node matches row");
        return MatchOutcome::default();
    };

    let description = row_field(config, row, &config.columns.description_field).unwrap_or("");
    let desc_match = normalize_name(&node.documentation) == normalize_name(description);

    matched.insert(node.id.clone());
    debug!(row = row.sequence, node_id = %node.id, desc_match, "Matched row to node");

    MatchOutcome {
        node: Some(node),
        name_match: true,
        desc_match,
    }
}
