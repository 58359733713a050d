//! Graph-derived fields for the merge's graph tier.

use modelsync_core::model::{FieldMap, GraphNode};
use modelsync_core::SyncConfig;

use crate::grouping::resolve_grouping;
use crate::store::ModelStore;

/// Property lookups plus supplement fields for a node: element id and type,
/// grouping outputs and view membership.
pub fn graph_fields<S: ModelStore + ?Sized>(store: &S, node: &GraphNode, config: &SyncConfig) -> FieldMap {
    let columns = &config.columns;
    let mut fields = FieldMap::new();

    for key in &columns.property_fields {
        if let Some(value) = node.property(key) {
            fields.insert(key.as_str(), value);
        }
    }

    fields.insert(columns.element_id_field.as_str(), node.id.as_str());
    fields.insert(columns.type_field.as_str(), node.node_type.as_str());

    let grouping = resolve_grouping(
        store,
        node,
        &config.grouping.relationship_types,
        &config.grouping.target_types,
    );
    let g = &config.grouping;
    fields.insert(g.target_name_field.as_str(), grouping.target_name);
    fields.insert(g.target_id_field.as_str(), grouping.target_id);
    fields.insert(g.rel_type_field.as_str(), grouping.rel_type);
    fields.insert(g.rel_id_field.as_str(), grouping.rel_id);

    fields.insert(columns.membership_field.as_str(), membership(store, &node.id, config));
    fields
}

/// Fallback graph tier for a row no node matched.
pub fn unmatched_fields(config: &SyncConfig) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        config.columns.membership_field.as_str(),
        config.columns.orphan_label.as_str(),
    );
    fields
}

/// Names of the views showing a node, or the orphan label when there are none.
pub fn membership<S: ModelStore + ?Sized>(store: &S, node_id: &str, config: &SyncConfig) -> String {
    let names: Vec<String> = store
        .views_containing(node_id)
        .into_iter()
        .map(|v| v.name)
        .collect();
    if names.is_empty() {
        config.columns.orphan_label.clone()
    } else {
        names.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;
    use modelsync_core::model::Bounds;

    #[test]
    fn test_graph_fields() {
        let mut model = MemoryModel::new();
        let parent = model.add_node("capability", "Payments");
        let node = model.add_node("capability", "Cards");
        model.set_property(&node, "Owner", "Alice".into()).unwrap();
        model.create_relationship("composition", &parent, &node).unwrap();
        let view = model.create_view("Payments HeatMap").unwrap();
        model.add_to_view(&view.id, &node, Bounds::default()).unwrap();

        let config = SyncConfig::default();
        let fields = graph_fields(&model, &model.node(&node).unwrap(), &config);
        assert_eq!(fields.get("Owner"), Some("Alice"));
        assert_eq!(fields.get("Element Id"), Some(node.as_str()));
        assert_eq!(fields.get("Type"), Some("capability"));
        assert_eq!(fields.get("Parent"), Some("Payments"));
        assert_eq!(fields.get("Parent Relationship"), Some("composition"));
        assert_eq!(fields.get("Views"), Some("Payments HeatMap"));
        assert_eq!(fields.get("Taxonomy Classification"), None);
    }

    #[test]
    fn test_orphan_fallbacks() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Cards");
        let config = SyncConfig::default();
        assert_eq!(membership(&model, &node, &config), "Orphan");
        assert_eq!(unmatched_fields(&config).get("Views"), Some("Orphan"));
    }
}
