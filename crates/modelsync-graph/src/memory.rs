//! In-memory model store with a JSON snapshot format.
//!
//! Iterates in insertion order, so "first match" is always the earliest
//! inserted candidate. Ids are sequential (`id-1`, `id-2`, ...) and the
//! counter is part of the snapshot.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use modelsync_core::model::{Bounds, Folder, GraphNode, PropertyValue, Relationship, View, ViewChild};
use modelsync_core::SyncResult;

use crate::store::{ModelStore, StoreError, StoreResult};

/// A node filed in a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub folder_id: String,
    pub node_id: String,
}

/// A view and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<ViewChild>,
}

/// Entity counts for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelCounts {
    pub nodes: usize,
    pub relationships: usize,
    pub folders: usize,
    pub views: usize,
    pub placements: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryModel {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    relationships: Vec<Relationship>,
    #[serde(default)]
    folders: Vec<Folder>,
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    views: Vec<ViewEntry>,
    #[serde(default)]
    next_id: u64,
    /// Property keys the host refuses to write. Never persisted.
    #[serde(skip)]
    locked_properties: BTreeSet<String>,
    /// Node types the host refuses to create. Never persisted.
    #[serde(skip)]
    locked_types: BTreeSet<String>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`MemoryModel::save_json_file`].
    pub fn from_json_file(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut model: MemoryModel = serde_json::from_str(&content)?;
        model.reseat_id_counter();
        debug!(path = %path.display(), nodes = model.nodes.len(), "Loaded model snapshot");
        Ok(model)
    }

    pub fn save_json_file(&self, path: &Path) -> SyncResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a top-level folder.
    pub fn add_root_folder(&mut self, name: &str) -> Folder {
        let folder = Folder {
            id: self.mint_id(),
            name: name.to_string(),
            parent: None,
        };
        self.folders.push(folder.clone());
        folder
    }

    /// Add a node without going through the fallible trait method.
    pub fn add_node(&mut self, node_type: &str, name: &str) -> String {
        let node = GraphNode::new(self.mint_id(), node_type, name);
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Add a non-geometric child (a connection) to a view.
    pub fn add_connection(&mut self, view_id: &str) -> StoreResult<ViewChild> {
        let id = self.mint_id();
        let view = self.view_entry_mut(view_id)?;
        let child = ViewChild {
            id,
            node_id: None,
            bounds: None,
        };
        view.children.push(child.clone());
        Ok(child)
    }

    pub fn lock_property(&mut self, key: &str) {
        self.locked_properties.insert(key.to_string());
    }

    pub fn lock_type(&mut self, node_type: &str) {
        self.locked_types.insert(node_type.to_lowercase());
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Folder a node is filed in, if any.
    pub fn folder_of(&self, node_id: &str) -> Option<&Folder> {
        let membership = self.memberships.iter().find(|m| m.node_id == node_id)?;
        self.folders.iter().find(|f| f.id == membership.folder_id)
    }

    pub fn counts(&self) -> ModelCounts {
        ModelCounts {
            nodes: self.nodes.len(),
            relationships: self.relationships.len(),
            folders: self.folders.len(),
            views: self.views.len(),
            placements: self
                .views
                .iter()
                .flat_map(|v| &v.children)
                .filter(|c| c.node_id.is_some())
                .count(),
        }
    }

    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("id-{}", self.next_id)
    }

    /// Keep minted ids clear of any id a hand-written snapshot already uses.
    fn reseat_id_counter(&mut self) {
        let highest = self
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(self.relationships.iter().map(|r| r.id.as_str()))
            .chain(self.folders.iter().map(|f| f.id.as_str()))
            .chain(self.views.iter().map(|v| v.id.as_str()))
            .chain(self.views.iter().flat_map(|v| v.children.iter().map(|c| c.id.as_str())))
            .filter_map(|id| id.strip_prefix("id-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest);
    }

    fn node_mut(&mut self, id: &str) -> StoreResult<&mut GraphNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("node {}", id)))
    }

    fn view_entry_mut(&mut self, id: &str) -> StoreResult<&mut ViewEntry> {
        self.views
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("view {}", id)))
    }
}

impl ModelStore for MemoryModel {
    fn find_nodes(&self, predicate: &dyn Fn(&GraphNode) -> bool) -> Vec<GraphNode> {
        self.nodes.iter().filter(|n| predicate(n)).cloned().collect()
    }

    fn node(&self, id: &str) -> Option<GraphNode> {
        self.nodes.iter().find(|n| n.id == id).cloned()
    }

    fn create_node(&mut self, node_type: &str, name: &str) -> StoreResult<GraphNode> {
        if self.locked_types.contains(&node_type.to_lowercase()) {
            return Err(StoreError::ReadOnly(format!("cannot create nodes of type {}", node_type)));
        }
        let node = GraphNode::new(self.mint_id(), node_type, name);
        self.nodes.push(node.clone());
        Ok(node)
    }

    fn property(&self, node_id: &str, key: &str) -> Option<PropertyValue> {
        self.nodes
            .iter()
            .find(|n| n.id == node_id)
            .and_then(|n| n.properties.get(key).cloned())
    }

    fn set_property(&mut self, node_id: &str, key: &str, value: PropertyValue) -> StoreResult<()> {
        if self.locked_properties.contains(key) {
            return Err(StoreError::ReadOnly(format!("property {}", key)));
        }
        self.node_mut(node_id)?.properties.insert(key.to_string(), value);
        Ok(())
    }

    fn set_documentation(&mut self, node_id: &str, documentation: &str) -> StoreResult<()> {
        self.node_mut(node_id)?.documentation = documentation.to_string();
        Ok(())
    }

    fn find_relationships(&self, predicate: &dyn Fn(&Relationship) -> bool) -> Vec<Relationship> {
        self.relationships.iter().filter(|r| predicate(r)).cloned().collect()
    }

    fn create_relationship(&mut self, rel_type: &str, source: &str, target: &str) -> StoreResult<Relationship> {
        for end in [source, target] {
            if !self.nodes.iter().any(|n| n.id == end) {
                return Err(StoreError::NotFound(format!("node {}", end)));
            }
        }
        let rel = Relationship {
            id: self.mint_id(),
            rel_type: rel_type.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        self.relationships.push(rel.clone());
        Ok(rel)
    }

    fn root_folder(&self, name: &str) -> Option<Folder> {
        self.folders
            .iter()
            .find(|f| f.parent.is_none() && f.name == name)
            .cloned()
    }

    fn folder_children(&self, folder_id: &str) -> Vec<Folder> {
        self.folders
            .iter()
            .filter(|f| f.parent.as_deref() == Some(folder_id))
            .cloned()
            .collect()
    }

    fn create_folder(&mut self, parent_id: &str, name: &str) -> StoreResult<Folder> {
        if !self.folders.iter().any(|f| f.id == parent_id) {
            return Err(StoreError::NotFound(format!("folder {}", parent_id)));
        }
        let folder = Folder {
            id: self.mint_id(),
            name: name.to_string(),
            parent: Some(parent_id.to_string()),
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }

    fn folder_members(&self, folder_id: &str) -> Vec<String> {
        self.memberships
            .iter()
            .filter(|m| m.folder_id == folder_id)
            .map(|m| m.node_id.clone())
            .collect()
    }

    fn add_to_folder(&mut self, folder_id: &str, node_id: &str) -> StoreResult<()> {
        if !self.folders.iter().any(|f| f.id == folder_id) {
            return Err(StoreError::NotFound(format!("folder {}", folder_id)));
        }
        if !self.nodes.iter().any(|n| n.id == node_id) {
            return Err(StoreError::NotFound(format!("node {}", node_id)));
        }
        self.memberships.retain(|m| m.node_id != node_id);
        self.memberships.push(Membership {
            folder_id: folder_id.to_string(),
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    fn find_views(&self, name: &str) -> Vec<View> {
        self.views
            .iter()
            .filter(|v| v.name == name)
            .map(|v| View {
                id: v.id.clone(),
                name: v.name.clone(),
            })
            .collect()
    }

    fn create_view(&mut self, name: &str) -> StoreResult<View> {
        let entry = ViewEntry {
            id: self.mint_id(),
            name: name.to_string(),
            children: Vec::new(),
        };
        let view = View {
            id: entry.id.clone(),
            name: entry.name.clone(),
        };
        self.views.push(entry);
        Ok(view)
    }

    fn view_children(&self, view_id: &str) -> Vec<ViewChild> {
        self.views
            .iter()
            .find(|v| v.id == view_id)
            .map(|v| v.children.clone())
            .unwrap_or_default()
    }

    fn add_to_view(&mut self, view_id: &str, node_id: &str, bounds: Bounds) -> StoreResult<ViewChild> {
        if !self.nodes.iter().any(|n| n.id == node_id) {
            return Err(StoreError::NotFound(format!("node {}", node_id)));
        }
        let id = self.mint_id();
        let view = self.view_entry_mut(view_id)?;
        let child = ViewChild {
            id,
            node_id: Some(node_id.to_string()),
            bounds: Some(bounds),
        };
        view.children.push(child.clone());
        Ok(child)
    }

    fn set_bounds(&mut self, view_id: &str, child_id: &str, bounds: Bounds) -> StoreResult<()> {
        let view = self.view_entry_mut(view_id)?;
        let child = view
            .children
            .iter_mut()
            .find(|c| c.id == child_id)
            .ok_or_else(|| StoreError::NotFound(format!("view child {}", child_id)))?;
        if child.bounds.is_none() {
            return Err(StoreError::OperationFailed(format!("{} has no bounds", child_id)));
        }
        child.bounds = Some(bounds);
        Ok(())
    }

    fn views_containing(&self, node_id: &str) -> Vec<View> {
        self.views
            .iter()
            .filter(|v| v.children.iter().any(|c| c.node_id.as_deref() == Some(node_id)))
            .map(|v| View {
                id: v.id.clone(),
                name: v.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_ids() {
        let mut model = MemoryModel::new();
        let a = model.add_node("capability", "A");
        let b = model.create_node("capability", "B").unwrap();
        assert_eq!(a, "id-1");
        assert_eq!(b.id, "id-2");
        let names: Vec<String> = model.find_nodes(&|_| true).into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_folder_membership_moves() {
        let mut model = MemoryModel::new();
        let root = model.add_root_folder("Strategy");
        let child = model.create_folder(&root.id, "HeatMap").unwrap();
        let node = model.add_node("capability", "A");
        model.add_to_folder(&root.id, &node).unwrap();
        model.add_to_folder(&child.id, &node).unwrap();
        assert!(model.folder_members(&root.id).is_empty());
        assert_eq!(model.folder_members(&child.id), vec![node.clone()]);
        assert_eq!(model.folder_of(&node).map(|f| f.name.as_str()), Some("HeatMap"));
    }

    #[test]
    fn test_locked_property_and_type() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "A");
        model.lock_property("Owner");
        model.lock_type("Grouping");
        assert!(model.set_property(&node, "Owner", "x".into()).is_err());
        assert!(model.set_property(&node, "Level", "1".into()).is_ok());
        assert!(model.create_node("grouping", "G").is_err());
    }

    #[test]
    fn test_set_bounds_rejects_connections() {
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "A");
        let view = model.create_view("V").unwrap();
        let placed = model.add_to_view(&view.id, &node, Bounds::new(0, 0, 10, 10)).unwrap();
        let conn = model.add_connection(&view.id).unwrap();
        assert!(model.set_bounds(&view.id, &placed.id, Bounds::new(5, 5, 10, 10)).is_ok());
        assert!(model.set_bounds(&view.id, &conn.id, Bounds::default()).is_err());
        assert_eq!(model.counts().placements, 1);
        assert_eq!(model.views_containing(&node).len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip_keeps_id_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = MemoryModel::new();
        model.add_root_folder("Strategy");
        model.add_node("capability", "A");
        model.save_json_file(&path).unwrap();

        let mut loaded = MemoryModel::from_json_file(&path).unwrap();
        assert_eq!(loaded.counts(), model.counts());
        let fresh = loaded.add_node("capability", "B");
        assert_eq!(fresh, "id-3");
    }

    #[test]
    fn test_locks_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = MemoryModel::new();
        let node = model.add_node("capability", "A");
        model.lock_property("Owner");
        model.lock_type("capability");
        model.save_json_file(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("locked"));
        let mut loaded = MemoryModel::from_json_file(&path).unwrap();
        assert!(loaded.set_property(&node, "Owner", "x".into()).is_ok());
        assert!(loaded.create_node("capability", "B").is_ok());
    }

    #[test]
    fn test_hand_written_snapshot() {
        let json = r#"{
            "nodes": [{"id": "id-7", "type": "capability", "name": "Payments",
                       "properties": {"Level": "1", "Critical": true}}],
            "folders": [{"id": "root", "name": "Strategy"}]
        }"#;
        let mut model: MemoryModel = serde_json::from_str(json).unwrap();
        model.reseat_id_counter();
        assert_eq!(model.property("id-7", "Critical"), Some(PropertyValue::Flag(true)));
        assert_eq!(model.add_node("capability", "B"), "id-8");
        assert!(model.root_folder("Strategy").is_some());
    }
}
