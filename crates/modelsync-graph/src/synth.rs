//! Records for nodes no row matched.

use std::collections::HashSet;

use tracing::debug;

use modelsync_core::codes::{apply_codes, CodeCache};
use modelsync_core::merge::merge_fields;
use modelsync_core::model::{GraphNode, MergedRecord, RecordOrigin};
use modelsync_core::SyncConfig;

use crate::extract::graph_fields;
use crate::store::ModelStore;

/// The field a node's name goes to at `level`, if the level is known.
pub fn level_name_field<'a>(config: &'a SyncConfig, level: &str) -> Option<&'a str> {
    config.levels.name_fields.get(level.trim()).map(String::as_str)
}

/// Build the record for one unmatched node.
pub fn synthesize_record<S: ModelStore + ?Sized>(store: &S, node: &GraphNode, config: &SyncConfig) -> MergedRecord {
    let mut record = MergedRecord::blank(config.recognized_fields(), RecordOrigin::ModelOnly);
    record.node_id = Some(node.id.clone());

    merge_fields(&mut record, &graph_fields(store, node, config), false);

    let level = node
        .property(&config.levels.field)
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| config.levels.default_level.clone());

    for field in config.levels.name_fields.values() {
        record.set(field.as_str(), "");
    }
    match level_name_field(config, &level) {
        Some(field) => record.set(field, node.name.as_str()),
        None => debug!(node_id = %node.id, level = %level, "No name column for level"),
    }

    record.set(config.columns.name_field.as_str(), node.name.as_str());
    record.set(config.columns.description_field.as_str(), node.documentation.as_str());
    record
}

/// Records for every in-scope node absent from `matched`, with model-only
/// reference codes applied.
pub fn synthesize_graph_only<S: ModelStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
    matched: &HashSet<String>,
    codes: &mut CodeCache,
) -> Vec<MergedRecord> {
    let nodes = store.find_nodes(&|n| config.elements.includes(&n.node_type) && !matched.contains(&n.id));
    let mut records: Vec<MergedRecord> = nodes
        .iter()
        .map(|node| synthesize_record(store, node, config))
        .collect();

    apply_codes(&mut records, &config.codes.model_only, codes);
    debug!(count = records.len(), "Synthesized graph-only records");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;
    use modelsync_core::model::{DESC_MATCH, MODEL_ONLY, NAME_MATCH};

    #[test]
    fn test_level_selects_name_column() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Card Issuing");
        model.set_property(&node, "Level", "2".into()).unwrap();
        model.set_documentation(&node, "Issue cards").unwrap();

        let config = SyncConfig::default();
        let record = synthesize_record(&model, &model.node(&node).unwrap(), &config);
        assert_eq!(record.get("Level 2"), "Card Issuing");
        assert_eq!(record.get("Domain"), "");
        assert_eq!(record.get("Level 1"), "");
        assert_eq!(record.get("Name"), "Card Issuing");
        assert_eq!(record.get("Description"), "Issue cards");
        assert_eq!(record.get(MODEL_ONLY), "1");
        assert_eq!(record.get(NAME_MATCH), "0");
        assert_eq!(record.get(DESC_MATCH), "0");
    }

    #[test]
    fn test_missing_level_defaults_to_zero() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "Payments");
        let record = synthesize_record(&model, &model.node(&node).unwrap(), &SyncConfig::default());
        assert_eq!(record.get("Domain"), "Payments");
    }

    #[test]
    fn test_only_unmatched_in_scope_nodes() {
        let mut model = MemoryModel::new();
        let matched_id = model.add_node("capability", "Matched");
        model.add_node("capability", "Unmatched");
        model.add_node("application-component", "Out Of Scope");

        let matched: HashSet<String> = [matched_id].into_iter().collect();
        let mut codes = CodeCache::new();
        let records = synthesize_graph_only(&model, &SyncConfig::default(), &matched, &mut codes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Name"), "Unmatched");
    }

    #[test]
    fn test_model_only_codes_use_parent() {
        let mut model = MemoryModel::new();
        let parent = model.add_node("capability", "Digital Banking");
        let child = model.add_node("capability", "Mobile App");
        model.set_property(&parent, "Level", "0".into()).unwrap();
        model.set_property(&child, "Level", "1".into()).unwrap();
        model.create_relationship("composition", &parent, &child).unwrap();

        let mut codes = CodeCache::new();
        let records = synthesize_graph_only(&model, &SyncConfig::default(), &HashSet::new(), &mut codes);
        let child_record = records.iter().find(|r| r.get("Name") == "Mobile App").unwrap();
        assert_eq!(child_record.get("Parent"), "Digital Banking");
        assert_eq!(child_record.get("Display Name"), "DB-Mobile App");
    }
}
