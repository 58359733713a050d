//! Graph-side entity types: nodes, relationships, folders and views.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A property value on a node. Hosts store either text or booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Flag(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

/// An element in the graph model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            name: name.into(),
            documentation: String::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Property value rendered as text, if set.
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).map(PropertyValue::as_text)
    }
}

/// A typed, directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub source: String,
    pub target: String,
}

impl Relationship {
    /// The endpoint opposite to `node_id`, or `None` if the edge does not touch it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A named container in the model's folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// A named diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
}

/// Position and size of a diagram object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// A child object of a view.
///
/// Element placements carry the backing node and bounds. Connections and other
/// decorations carry neither and are skipped by layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewChild {
    pub id: String,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

impl ViewChild {
    pub fn is_geometric(&self) -> bool {
        self.bounds.is_some()
    }
}

/// The relationship chosen to represent a node's parent/category.
///
/// All fields are empty when no grouping relationship exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingResult {
    pub target_name: String,
    pub target_id: String,
    pub rel_type: String,
    pub rel_id: String,
}

impl GroupingResult {
    pub fn is_empty(&self) -> bool {
        self.target_id.is_empty() && self.rel_id.is_empty()
    }
}
