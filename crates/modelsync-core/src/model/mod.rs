//! Data model shared by the reconciliation pipeline.

pub mod fields;
pub mod graph;
pub mod record;

pub use fields::{alphanumeric_only, normalize_name, FieldMap};
pub use graph::{
    Bounds, Folder, GraphNode, GroupingResult, PropertyValue, Relationship, View, ViewChild,
};
pub use record::{
    MergedRecord, RecordOrigin, SourceRow, DESC_MATCH, MODEL_ONLY, NAME_MATCH, PROVENANCE_FLAGS,
};
