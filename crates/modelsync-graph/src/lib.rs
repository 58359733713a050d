//! # modelsync graph
//!
//! Graph-model side of the reconciliation pipeline.
//!
//! Defines the [`ModelStore`] trait hosts implement, an in-memory store with
//! JSON snapshots, and the stages that read from and write to a store:
//! matching, grouping, graph-only synthesis, taxonomy folders, node upserts
//! and view synchronization.

pub mod extract;
pub mod folders;
pub mod grouping;
pub mod matcher;
pub mod memory;
pub mod reconcile;
pub mod store;
pub mod sync;
pub mod synth;
pub mod upsert;
pub mod views;

pub use memory::{MemoryModel, ModelCounts};
pub use reconcile::{reconcile, ReconcileContext, Reconciliation};
pub use store::{ModelStore, StoreError, StoreResult};
pub use sync::{export_graph_only, run_sync, SyncOutcome, SyncReport};
pub use upsert::{upsert_node, UpsertAction, UpsertOutcome};
pub use views::{sync_views, ViewSyncOutcome};
