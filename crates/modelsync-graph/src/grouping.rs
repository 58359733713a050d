//! Grouping relationship resolution.
//!
//! Relationship types are a precedence list, not a filter. The first type
//! with any relationship touching the node decides the outcome: a relationship
//! whose other end is a preferred target type if there is one, else the first
//! relationship of that type. Later types are never consulted once an earlier
//! one has relationships.

use tracing::debug;

use modelsync_core::model::{GraphNode, GroupingResult};

use crate::store::ModelStore;

/// Resolve the grouping of `node`.
pub fn resolve_grouping<S: ModelStore + ?Sized>(
    store: &S,
    node: &GraphNode,
    relationship_types: &[String],
    target_types: &[String],
) -> GroupingResult {
    let all_incident = store.incident_relationships(&node.id);

    for rel_type in relationship_types {
        let incident: Vec<_> = all_incident
            .iter()
            .filter(|r| r.rel_type.eq_ignore_ascii_case(rel_type))
            .collect();
        if incident.is_empty() {
            continue;
        }

        let ends: Vec<_> = incident
            .iter()
            .map(|rel| {
                let other = rel.other_end(&node.id).and_then(|id| store.node(id));
                (rel, other)
            })
            .collect();

        let preferred = ends.iter().find(|(_, other)| {
            other.as_ref().is_some_and(|o| {
                target_types.iter().any(|t| t.eq_ignore_ascii_case(&o.node_type))
            })
        });
        let (rel, other) = preferred.unwrap_or(&ends[0]);

        debug!(
            node_id = %node.id,
            rel_type = %rel.rel_type,
            preferred = preferred.is_some(),
            "Resolved grouping"
        );
        return GroupingResult {
            target_name: other.as_ref().map(|o| o.name.clone()).unwrap_or_default(),
            target_id: rel.other_end(&node.id).unwrap_or_default().to_string(),
            rel_type: rel.rel_type.clone(),
            rel_id: rel.id.clone(),
        };
    }
    GroupingResult::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;

    fn types(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefers_target_type_within_first_type() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Cards");
        let app = model.add_node("application-component", "Card System");
        let parent = model.add_node("capability", "Payments");
        model.create_relationship("composition", &app, &node).unwrap();
        let rel = model.create_relationship("composition", &parent, &node).unwrap();

        let n = model.node(&node).unwrap();
        let result = resolve_grouping(&model, &n, &types(&["composition"]), &types(&["Capability"]));
        assert_eq!(result.target_name, "Payments");
        assert_eq!(result.target_id, parent);
        assert_eq!(result.rel_id, rel.id);
    }

    #[test]
    fn test_falls_back_to_first_of_type_and_stops() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Cards");
        let app = model.add_node("application-component", "Card System");
        let parent = model.add_node("capability", "Payments");
        let first = model.create_relationship("composition", &node, &app).unwrap();
        model.create_relationship("aggregation", &parent, &node).unwrap();

        let n = model.node(&node).unwrap();
        let result = resolve_grouping(
            &model,
            &n,
            &types(&["composition", "aggregation"]),
            &types(&["capability"]),
        );
        assert_eq!(result.target_name, "Card System");
        assert_eq!(result.rel_id, first.id);
        assert_eq!(result.rel_type, "composition");
    }

    #[test]
    fn test_later_type_used_when_earlier_has_none() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Cards");
        let parent = model.add_node("capability", "Payments");
        model.create_relationship("aggregation", &parent, &node).unwrap();

        let n = model.node(&node).unwrap();
        let result = resolve_grouping(&model, &n, &types(&["composition", "aggregation"]), &types(&["capability"]));
        assert_eq!(result.target_name, "Payments");
        assert_eq!(result.rel_type, "aggregation");
    }

    #[test]
    fn test_empty_sentinel() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Alone");
        let n = model.node(&node).unwrap();
        let result = resolve_grouping(&model, &n, &types(&["composition"]), &types(&["capability"]));
        assert!(result.is_empty());
        assert_eq!(result, GroupingResult::default());
    }
}
