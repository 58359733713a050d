//! Find-or-create of nodes from merged records.

use tracing::{debug, warn};

use modelsync_core::model::{Folder, GraphNode, MergedRecord, PropertyValue};
use modelsync_core::{SyncConfig, SyncError, SyncResult};

use crate::folders::resolve_segment_folder;
use crate::store::ModelStore;

/// Whether the upsert created a node or reused one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Added,
    Updated,
}

impl UpsertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
        }
    }
}

/// Outcome of writing one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyWrite {
    Set,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub node_id: String,
    /// Per-key results, in configuration order.
    pub properties: Vec<(String, PropertyWrite)>,
    pub documentation_failed: bool,
    /// Folder the node is filed in after the upsert, if any.
    pub folder_id: Option<String>,
    /// Whether the node had to be moved into that folder.
    pub moved: bool,
    /// Whether the taxonomy folder could not be resolved and the root was used.
    pub folder_fallback: bool,
}

impl UpsertOutcome {
    pub fn property_failures(&self) -> usize {
        self.properties
            .iter()
            .filter(|(_, w)| matches!(w, PropertyWrite::Failed(_)))
            .count()
    }
}

/// Existing node of exactly this type and name, else the node the record was
/// matched to when its type agrees.
fn find_existing<S: ModelStore + ?Sized>(
    store: &S,
    node_type: &str,
    name: &str,
    matched: Option<&str>,
) -> Option<GraphNode> {
    let exact = store
        .find_nodes(&|n| n.node_type.eq_ignore_ascii_case(node_type) && n.name == name)
        .into_iter()
        .next();
    exact.or_else(|| {
        matched
            .and_then(|id| store.node(id))
            .filter(|n| n.node_type.eq_ignore_ascii_case(node_type))
    })
}

/// Create or update the node for `record` and file it under `root`.
///
/// Missing name or type is a validation error and a failed node creation is a
/// mutation error. Documentation, property and folder problems are logged
/// and reported in the outcome without failing the upsert.
pub fn upsert_node<S: ModelStore + ?Sized>(
    store: &mut S,
    record: &MergedRecord,
    root: Option<&Folder>,
    config: &SyncConfig,
) -> SyncResult<UpsertOutcome> {
    let columns = &config.columns;
    let name = record.get(&columns.name_field).trim();
    let node_type = record.get(&columns.type_field).trim();
    if name.is_empty() {
        return Err(SyncError::validation(format!("{} has no {}", record.label(), columns.name_field)));
    }
    if node_type.is_empty() {
        return Err(SyncError::validation(format!("{} has no {}", record.label(), columns.type_field)));
    }

    let (node, action) = match find_existing(store, node_type, name, record.node_id.as_deref()) {
        Some(node) => (node, UpsertAction::Updated),
        None => {
            let node = store
                .create_node(node_type, name)
                .map_err(|e| e.for_entity(format!("{} '{}'", node_type, name)))?;
            debug!(node_id = %node.id, node_type, name, "Created node");
            (node, UpsertAction::Added)
        }
    };

    let mut documentation_failed = false;
    let description = record.get(&columns.description_field);
    if !description.is_empty() && node.documentation != description {
        if let Err(e) = store.set_documentation(&node.id, description) {
            warn!(node_id = %node.id, error = %e, "Failed to set documentation");
            documentation_failed = true;
        }
    }

    let properties = write_properties(store, &node, record, config);

    let mut outcome = UpsertOutcome {
        action,
        node_id: node.id.clone(),
        properties,
        documentation_failed,
        folder_id: None,
        moved: false,
        folder_fallback: false,
    };

    if let Some(root) = root {
        file_node(store, &node, record, root, config, &mut outcome);
    } else {
        warn!(node_id = %node.id, "No root folder available, node left where it is");
    }

    Ok(outcome)
}

/// Best-effort write of every non-empty `property_fields` key. One failing
/// key does not stop the others.
fn write_properties<S: ModelStore + ?Sized>(
    store: &mut S,
    node: &GraphNode,
    record: &MergedRecord,
    config: &SyncConfig,
) -> Vec<(String, PropertyWrite)> {
    let columns = &config.columns;
    let skip = [&columns.name_field, &columns.type_field, &columns.description_field];

    let mut results = Vec::new();
    for key in &columns.property_fields {
        if skip.contains(&key) {
            continue;
        }
        let value = record.get(key);
        if value.is_empty() {
            continue;
        }
        let write = if node.property(key).as_deref() == Some(value) {
            PropertyWrite::Unchanged
        } else {
            match store.set_property(&node.id, key, PropertyValue::from(value)) {
                Ok(()) => PropertyWrite::Set,
                Err(e) => {
                    warn!(node_id = %node.id, property = %key, error = %e, "Failed to set property");
                    PropertyWrite::Failed(e.to_string())
                }
            }
        };
        results.push((key.clone(), write));
    }
    results
}

/// Put the node in its taxonomy folder, or in `root` when that cannot be
/// resolved. Nodes already in the folder are left alone.
fn file_node<S: ModelStore + ?Sized>(
    store: &mut S,
    node: &GraphNode,
    record: &MergedRecord,
    root: &Folder,
    config: &SyncConfig,
    outcome: &mut UpsertOutcome,
) {
    let classification = record.get(&config.taxonomy.field).trim();
    let target = if classification.is_empty() {
        root.clone()
    } else {
        match resolve_segment_folder(store, root, config, classification) {
            Ok(folder) => folder,
            Err(e) => {
                warn!(node_id = %node.id, classification, error = %e, "Taxonomy folder unresolved, using root folder");
                outcome.folder_fallback = true;
                root.clone()
            }
        }
    };

    if store.folder_members(&target.id).iter().any(|id| *id == node.id) {
        outcome.folder_id = Some(target.id);
        return;
    }
    match store.add_to_folder(&target.id, &node.id) {
        Ok(()) => {
            debug!(node_id = %node.id, folder = %target.name, "Filed node in folder");
            outcome.moved = true;
            outcome.folder_id = Some(target.id);
        }
        Err(e) => warn!(node_id = %node.id, folder = %target.name, error = %e, "Failed to file node"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;
    use modelsync_core::model::RecordOrigin;

    fn record(pairs: &[(&str, &str)]) -> MergedRecord {
        let config = SyncConfig::default();
        let mut r = MergedRecord::blank(config.recognized_fields(), RecordOrigin::Row(3));
        for (k, v) in pairs {
            r.set(*k, *v);
        }
        r
    }

    fn strategy(model: &mut MemoryModel) -> Folder {
        model.add_root_folder("Strategy")
    }

    #[test]
    fn test_add_then_update() {
        let mut model = MemoryModel::new();
        let root = strategy(&mut model);
        let config = SyncConfig::default();
        let rec = record(&[
            ("Name", "Payments"),
            ("Type", "capability"),
            ("Description", "Move money"),
            ("Owner", "Alice"),
            ("Taxonomy Classification", "Customer"),
        ]);

        let first = upsert_node(&mut model, &rec, Some(&root), &config).unwrap();
        assert_eq!(first.action.as_str(), "added");
        assert!(first.moved);
        let node = model.node(&first.node_id).unwrap();
        assert_eq!(node.documentation, "Move money");
        assert_eq!(node.property("Owner"), Some("Alice".to_string()));
        assert_eq!(model.folder_of(&node.id).map(|f| f.name.clone()), Some("Customer".to_string()));

        let second = upsert_node(&mut model, &rec, Some(&root), &config).unwrap();
        assert_eq!(second.action, UpsertAction::Updated);
        assert_eq!(second.node_id, first.node_id);
        assert!(!second.moved);
        assert!(second.properties.iter().all(|(_, w)| *w == PropertyWrite::Unchanged));
        assert_eq!(model.nodes().len(), 1);
    }

    #[test]
    fn test_missing_name_or_type() {
        let mut model = MemoryModel::new();
        let config = SyncConfig::default();
        let err = upsert_node(&mut model, &record(&[("Type", "capability")]), None, &config).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        let err = upsert_node(&mut model, &record(&[("Name", "X")]), None, &config).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }

    #[test]
    fn test_property_failures_are_isolated() {
        let mut model = MemoryModel::new();
        model.lock_property("Owner");
        let config = SyncConfig::default();
        let rec = record(&[("Name", "Payments"), ("Type", "capability"), ("Owner", "Alice"), ("Level", "1")]);
        let outcome = upsert_node(&mut model, &rec, None, &config).unwrap();
        assert_eq!(outcome.property_failures(), 1);
        let node = model.node(&outcome.node_id).unwrap();
        assert_eq!(node.property("Level"), Some("1".to_string()));
        assert_eq!(node.property("Owner"), None);
    }

    #[test]
    fn test_only_property_fields_are_written() {
        let mut model = MemoryModel::new();
        let config = SyncConfig::default();
        let rec = record(&[
            ("Name", "Payments"),
            ("Type", "capability"),
            ("Owner", "Alice"),
            ("Domain", "Retail"),
            ("Parent", "Banking"),
        ]);
        let outcome = upsert_node(&mut model, &rec, None, &config).unwrap();
        let keys: Vec<&str> = outcome.properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Owner"]);
        let node = model.node(&outcome.node_id).unwrap();
        assert_eq!(node.property("Owner"), Some("Alice".to_string()));
        assert_eq!(node.property("Domain"), None);
        assert_eq!(node.property("Parent"), None);
    }

    #[test]
    fn test_creation_failure_propagates() {
        let mut model = MemoryModel::new();
        model.lock_type("capability");
        let config = SyncConfig::default();
        let rec = record(&[("Name", "Payments"), ("Type", "capability")]);
        let err = upsert_node(&mut model, &rec, None, &config).unwrap_err();
        assert!(matches!(err, SyncError::Mutation { .. }));
    }

    #[test]
    fn test_unknown_taxonomy_falls_back_to_root() {
        let mut model = MemoryModel::new();
        let root = strategy(&mut model);
        let config = SyncConfig::default();
        let rec = record(&[("Name", "Payments"), ("Type", "capability"), ("Taxonomy Classification", "Legacy")]);
        let outcome = upsert_node(&mut model, &rec, Some(&root), &config).unwrap();
        assert!(outcome.folder_fallback);
        assert_eq!(outcome.folder_id, Some(root.id.clone()));
    }

    #[test]
    fn test_reuses_matched_node_with_different_case() {
        let mut model = MemoryModel::new();
        let id = model.add_node("capability", "Payments");
        let config = SyncConfig::default();
        let mut rec = record(&[("Name", "payments"), ("Type", "Capability")]);
        rec.node_id = Some(id.clone());
        let outcome = upsert_node(&mut model, &rec, None, &config).unwrap();
        assert_eq!(outcome.action, UpsertAction::Updated);
        assert_eq!(outcome.node_id, id);
    }
}
