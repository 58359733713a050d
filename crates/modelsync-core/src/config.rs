//! Static reconciliation configuration.
//!
//! Loaded from TOML. Every section has defaults, so an absent file or an
//! absent section falls back to the layout of a capability heat-map workbook.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::model::{alphanumeric_only, Bounds, MODEL_ONLY, PROVENANCE_FLAGS};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub columns: ColumnConfig,
    pub elements: ElementConfig,
    pub taxonomy: TaxonomyConfig,
    pub grouping: GroupingConfig,
    pub levels: LevelConfig,
    pub identity: IdentityConfig,
    pub codes: CodesConfig,
    pub folders: FolderConfig,
    pub views: ViewConfig,
}

/// Column layout of the tabular source and the recognized output fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Columns every row must carry a value for before it may be upserted.
    pub required: Vec<String>,
    /// Source column name to recognized field name.
    pub rename: BTreeMap<String, String>,
    /// Recognized field names, in output order.
    pub fields: Vec<String>,
    /// Fields copied verbatim from the row.
    pub sheet_fields: Vec<String>,
    /// The recognized node property keys. Only these are read from and
    /// written to node properties; every other field is derived.
    pub property_fields: Vec<String>,
    /// Fields always taken from the row when the row carries them.
    pub sheet_overrides: Vec<String>,
    pub name_field: String,
    pub description_field: String,
    pub type_field: String,
    pub element_id_field: String,
    pub membership_field: String,
    pub orphan_label: String,
    /// Filled with the run timestamp when set.
    pub synced_at_field: Option<String>,
    /// Leading rows dropped from grid input. The last one names the columns.
    pub header_rows: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            required: strings(&["Name"]),
            rename: BTreeMap::new(),
            fields: strings(&[
                "Name",
                "Description",
                "Type",
                "Element Id",
                "Domain",
                "Level 1",
                "Level 2",
                "Level 3",
                "Level",
                "Taxonomy Classification",
                "Owner",
                "Parent",
                "Parent Id",
                "Parent Relationship",
                "Parent Relationship Id",
                "Views",
                "UUID",
                "Display Name",
            ]),
            sheet_fields: strings(&[
                "Name",
                "Description",
                "Type",
                "Domain",
                "Level 1",
                "Level 2",
                "Level 3",
                "Level",
                "Taxonomy Classification",
                "Owner",
                "UUID",
            ]),
            property_fields: strings(&["Level", "Taxonomy Classification", "Owner"]),
            sheet_overrides: strings(&["Taxonomy Classification", "Level"]),
            name_field: "Name".to_string(),
            description_field: "Description".to_string(),
            type_field: "Type".to_string(),
            element_id_field: "Element Id".to_string(),
            membership_field: "Views".to_string(),
            orphan_label: "Orphan".to_string(),
            synced_at_field: None,
            header_rows: 2,
        }
    }
}

/// Element types taking part in the sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    /// Node types considered for matching and graph-only synthesis.
    /// Empty means every type.
    pub types: Vec<String>,
    /// Type given to rows that do not name one.
    pub default_type: String,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            types: strings(&["capability"]),
            default_type: "capability".to_string(),
        }
    }
}

impl ElementConfig {
    /// Whether nodes of `node_type` take part (case-insensitive).
    pub fn includes(&self, node_type: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t.eq_ignore_ascii_case(node_type))
    }
}

/// Taxonomy classification and its folder segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    pub field: String,
    /// Separates the segment from any sub-classification in a cell value.
    pub delimiter: String,
    /// Segment names in folder creation order.
    pub segments: Vec<String>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            field: "Taxonomy Classification".to_string(),
            delimiter: ">".to_string(),
            segments: strings(&[
                "Customer",
                "Product & Service",
                "Operations",
                "Risk & Compliance",
                "Security",
                "Data & Analytics",
                "Enterprise Support",
            ]),
        }
    }
}

impl TaxonomyConfig {
    /// Segment folder names, stripped to alphanumerics.
    pub fn folder_names(&self) -> Vec<String> {
        self.segments.iter().map(|s| alphanumeric_only(s)).collect()
    }

    /// Folder name for a classification cell value.
    ///
    /// The leading delimiter-separated part is normalized and compared against
    /// the normalized segments, ignoring case.
    pub fn segment_for(&self, value: &str) -> Option<String> {
        let head = if self.delimiter.is_empty() {
            value
        } else {
            value.split(self.delimiter.as_str()).next().unwrap_or("")
        };
        let wanted = alphanumeric_only(head.trim());
        if wanted.is_empty() {
            return None;
        }
        self.folder_names()
            .into_iter()
            .find(|name| name.eq_ignore_ascii_case(&wanted))
    }
}

/// Grouping relationship precedence and the fields it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Relationship types, tried in order. The first type with any incident
    /// relationship decides the grouping.
    pub relationship_types: Vec<String>,
    /// Node types preferred as grouping targets (case-insensitive).
    pub target_types: Vec<String>,
    pub target_name_field: String,
    pub target_id_field: String,
    pub rel_type_field: String,
    pub rel_id_field: String,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            relationship_types: strings(&["composition", "aggregation", "specialization", "association"]),
            target_types: strings(&["capability", "grouping"]),
            target_name_field: "Parent".to_string(),
            target_id_field: "Parent Id".to_string(),
            rel_type_field: "Parent Relationship".to_string(),
            rel_id_field: "Parent Relationship Id".to_string(),
        }
    }
}

/// Hierarchy level property and the column each level's name lands in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub field: String,
    pub default_level: String,
    /// Level value to the field receiving the node name.
    pub name_fields: BTreeMap<String, String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let name_fields = [("0", "Domain"), ("1", "Level 1"), ("2", "Level 2"), ("3", "Level 3")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            field: "Level".to_string(),
            default_level: "0".to_string(),
            name_fields,
        }
    }
}

/// How identifiers are produced for first-seen composites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// A fresh random UUID per run.
    #[default]
    Random,
    /// A name-based UUID derived from the composite, stable across runs.
    Deterministic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub key_columns: Vec<String>,
    pub field: String,
    pub mode: IdentityMode,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_columns: strings(&["Domain", "Level 1", "Level 2", "Level 3", "Name"]),
            field: "UUID".to_string(),
            mode: IdentityMode::Random,
        }
    }
}

/// Columns a reference code is derived from and written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapping {
    pub source: String,
    /// Tried in order; the first non-empty one is the reference.
    pub references: Vec<String>,
    pub output: String,
}

impl CodeMapping {
    /// Identifies which columns are involved, for cache reuse.
    pub fn signature(&self) -> String {
        format!("{}|{}|{}", self.source, self.references.join(","), self.output)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesConfig {
    pub sheet: CodeMapping,
    pub model_only: CodeMapping,
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            sheet: CodeMapping {
                source: "Domain".to_string(),
                references: strings(&["Level 1", "Name"]),
                output: "Display Name".to_string(),
            },
            model_only: CodeMapping {
                source: "Parent".to_string(),
                references: strings(&["Name"]),
                output: "Display Name".to_string(),
            },
        }
    }
}

/// Folder naming conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    /// Pre-existing root category folders that get a heat-map subtree.
    pub roots: Vec<String>,
    pub heatmap: String,
    /// Element type to the root folder its nodes are filed under.
    pub type_roots: BTreeMap<String, String>,
    pub default_root: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        let type_roots = [("capability", "Strategy"), ("resource", "Strategy"), ("business-function", "Business")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            roots: strings(&["Strategy", "Business"]),
            heatmap: "HeatMap".to_string(),
            type_roots,
            default_root: "Strategy".to_string(),
        }
    }
}

impl FolderConfig {
    /// Root folder name for an element type.
    pub fn root_for(&self, node_type: &str) -> &str {
        self.type_roots
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(node_type))
            .map(|(_, root)| root.as_str())
            .unwrap_or(&self.default_root)
    }
}

/// View naming and grid layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub suffix: String,
    /// Field carrying the label that selects a record's view.
    pub domain_field: String,
    /// Label used for records with an empty domain.
    pub root_label: String,
    pub cell_width: i32,
    pub cell_height: i32,
    /// Where new placements are dropped before layout.
    pub placeholder: Bounds,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            suffix: "HeatMap".to_string(),
            domain_field: "Domain".to_string(),
            root_label: "Enterprise".to_string(),
            cell_width: 160,
            cell_height: 80,
            placeholder: Bounds::new(0, 0, 120, 55),
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SyncResult<Self> {
        let config: SyncConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> SyncResult<()> {
        let c = &self.columns;
        if c.fields.is_empty() {
            return Err(SyncError::config("columns.fields must not be empty"));
        }
        for (what, field) in [("name_field", &c.name_field), ("type_field", &c.type_field)] {
            if !c.fields.contains(field) {
                return Err(SyncError::config(format!(
                    "columns.{} '{}' is not a recognized field",
                    what, field
                )));
            }
        }
        if self.grouping.relationship_types.is_empty() {
            return Err(SyncError::config("grouping.relationship_types must not be empty"));
        }
        if self.views.cell_width <= 0 || self.views.cell_height <= 0 {
            return Err(SyncError::config("views cell size must be positive"));
        }
        if self.folders.heatmap.is_empty() {
            return Err(SyncError::config("folders.heatmap must not be empty"));
        }
        if self.elements.default_type.is_empty() {
            return Err(SyncError::config("elements.default_type must not be empty"));
        }
        Ok(())
    }

    /// Recognized field names, in output order.
    pub fn recognized_fields(&self) -> impl Iterator<Item = &str> {
        self.columns.fields.iter().map(String::as_str)
    }

    /// Output header: recognized fields followed by the provenance flags.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.columns.fields.clone();
        for flag in PROVENANCE_FLAGS {
            if !headers.iter().any(|h| h == flag) {
                headers.push(flag.to_string());
            }
        }
        debug_assert!(headers.iter().any(|h| h == MODEL_ONLY));
        headers
    }

    /// Field name a source column maps to.
    pub fn field_for_column<'a>(&'a self, column: &'a str) -> &'a str {
        self.columns
            .rename
            .get(column)
            .map(String::as_str)
            .unwrap_or(column)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SyncConfig::from_toml_str(
            r#"
[views]
suffix = "Map"
cell_width = 200

[identity]
mode = "deterministic"
"#,
        )
        .unwrap();
        assert_eq!(config.views.suffix, "Map");
        assert_eq!(config.views.cell_width, 200);
        assert_eq!(config.views.cell_height, 80);
        assert_eq!(config.identity.mode, IdentityMode::Deterministic);
        assert_eq!(config.columns.name_field, "Name");
    }

    #[test]
    fn test_example_config_parses() {
        let config = SyncConfig::from_toml_str(include_str!("../../../modelsync.example.toml")).unwrap();
        assert_eq!(config.field_for_column("Capability"), "Name");
        assert_eq!(config.taxonomy.segments, TaxonomyConfig::default().segments);
        assert_eq!(config.codes, CodesConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = SyncConfig::from_toml_str("[grouping]\nrelationship_types = []\n").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));

        let err = SyncConfig::from_toml_str("[views]\ncell_height = 0\n").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_segment_for() {
        let taxonomy = TaxonomyConfig::default();
        assert_eq!(taxonomy.segment_for("Security > Identity"), Some("Security".to_string()));
        assert_eq!(taxonomy.segment_for("risk & compliance"), Some("RiskCompliance".to_string()));
        assert_eq!(taxonomy.segment_for("Legacy"), None);
        assert_eq!(taxonomy.segment_for(""), None);
    }

    #[test]
    fn test_root_for_type() {
        let folders = FolderConfig::default();
        assert_eq!(folders.root_for("Capability"), "Strategy");
        assert_eq!(folders.root_for("business-function"), "Business");
        assert_eq!(folders.root_for("node"), "Strategy");
    }

    #[test]
    fn test_output_headers_end_with_flags() {
        let headers = SyncConfig::default().output_headers();
        let tail: Vec<&str> = headers[headers.len() - 3..].iter().map(String::as_str).collect();
        assert_eq!(tail, vec!["nameMatch", "descMatch", "modelOnly"]);
    }
}
