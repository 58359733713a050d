//! The graph store interface the engine runs against.
//!
//! Hosts provide predicate queries, node/relationship creation, property and
//! documentation access, the folder tree and views. Every method is
//! synchronous. Iteration order of query results is the store's own order and
//! is what "first match" refers to throughout the engine.

use thiserror::Error;

use modelsync_core::model::{Bounds, Folder, GraphNode, PropertyValue, Relationship, View, ViewChild};
use modelsync_core::SyncError;

/// Store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Read-only: {0}")]
    ReadOnly(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Convert into a mutation failure naming the entity it concerned.
    pub fn for_entity(self, entity: impl Into<String>) -> SyncError {
        SyncError::mutation(entity, self.to_string())
    }
}

/// Graph model primitives.
pub trait ModelStore {
    /// Nodes satisfying `predicate`, in store order.
    fn find_nodes(&self, predicate: &dyn Fn(&GraphNode) -> bool) -> Vec<GraphNode>;

    fn node(&self, id: &str) -> Option<GraphNode>;

    fn create_node(&mut self, node_type: &str, name: &str) -> StoreResult<GraphNode>;

    fn property(&self, node_id: &str, key: &str) -> Option<PropertyValue>;

    fn set_property(&mut self, node_id: &str, key: &str, value: PropertyValue) -> StoreResult<()>;

    fn set_documentation(&mut self, node_id: &str, documentation: &str) -> StoreResult<()>;

    /// Relationships satisfying `predicate`, in store order.
    fn find_relationships(&self, predicate: &dyn Fn(&Relationship) -> bool) -> Vec<Relationship>;

    fn create_relationship(&mut self, rel_type: &str, source: &str, target: &str) -> StoreResult<Relationship>;

    /// Top-level folders with exactly this name.
    fn root_folder(&self, name: &str) -> Option<Folder>;

    fn folder_children(&self, folder_id: &str) -> Vec<Folder>;

    fn create_folder(&mut self, parent_id: &str, name: &str) -> StoreResult<Folder>;

    /// Ids of the nodes filed directly in a folder.
    fn folder_members(&self, folder_id: &str) -> Vec<String>;

    /// File a node in a folder, removing it from any previous folder.
    fn add_to_folder(&mut self, folder_id: &str, node_id: &str) -> StoreResult<()>;

    /// Views with exactly this name.
    fn find_views(&self, name: &str) -> Vec<View>;

    fn create_view(&mut self, name: &str) -> StoreResult<View>;

    /// All children of a view, geometric or not.
    fn view_children(&self, view_id: &str) -> Vec<ViewChild>;

    fn add_to_view(&mut self, view_id: &str, node_id: &str, bounds: Bounds) -> StoreResult<ViewChild>;

    fn set_bounds(&mut self, view_id: &str, child_id: &str, bounds: Bounds) -> StoreResult<()>;

    /// Relationships touching `node_id` in either direction.
    fn incident_relationships(&self, node_id: &str) -> Vec<Relationship> {
        self.find_relationships(&|r| r.touches(node_id))
    }

    /// Views containing a placement backed by `node_id`.
    fn views_containing(&self, node_id: &str) -> Vec<View>;
}
