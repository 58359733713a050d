//! Multi-source property merging.
//!
//! A record starts with every recognized field empty and is filled in three
//! tiers: row values, graph-derived values (never replacing a value already
//! set unless asked to), and dynamic values (always replacing). The
//! configured override fields are then copied from the row once more, so the
//! sheet wins for them whatever the graph says.

use crate::config::SyncConfig;
use crate::model::{FieldMap, MergedRecord, RecordOrigin, SourceRow};

/// Merge one source row with its graph-derived and dynamic fields.
pub fn merge_record(
    config: &SyncConfig,
    row: &SourceRow,
    graph: &FieldMap,
    dynamic: Option<&FieldMap>,
) -> MergedRecord {
    let mut record = MergedRecord::blank(config.recognized_fields(), RecordOrigin::Row(row.sequence));

    apply_sheet_tier(&mut record, row, config);
    merge_fields(&mut record, graph, false);
    if let Some(dynamic) = dynamic {
        merge_fields(&mut record, dynamic, true);
    }
    apply_sheet_overrides(&mut record, row, config);

    record
}

/// Copy the configured sheet fields from the row, after column renaming.
pub fn apply_sheet_tier(record: &mut MergedRecord, row: &SourceRow, config: &SyncConfig) {
    for (column, value) in row.fields.iter() {
        let field = config.field_for_column(column);
        if config.columns.sheet_fields.iter().any(|f| f == field) {
            record.set(field, value);
        }
    }
}

/// Merge `fields` into `record`, limited to keys the record already carries.
///
/// Without `overwrite`, a key that already has a non-empty value keeps it and
/// empty incoming values are ignored.
pub fn merge_fields(record: &mut MergedRecord, fields: &FieldMap, overwrite: bool) {
    for (key, value) in fields.iter() {
        let Some(current) = record.fields.get(key) else {
            continue;
        };
        if !overwrite && (!current.is_empty() || value.is_empty()) {
            continue;
        }
        record.set(key, value);
    }
}

/// Force-copy the override fields from the row wherever the row carries them.
pub fn apply_sheet_overrides(record: &mut MergedRecord, row: &SourceRow, config: &SyncConfig) {
    for field in &config.columns.sheet_overrides {
        if let Some(value) = row_field(config, row, field) {
            record.set(field.as_str(), value);
        }
    }
}

/// The row's value for a recognized field, looking through column renames.
pub fn row_field<'a>(config: &SyncConfig, row: &'a SourceRow, field: &str) -> Option<&'a str> {
    row.fields
        .iter()
        .find(|(column, _)| config.field_for_column(column) == field)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> SourceRow {
        SourceRow::new(pairs.iter().copied().collect(), 3)
    }

    #[test]
    fn test_sheet_override_beats_model() {
        let config = SyncConfig::default();
        let row = row(&[
            ("Name", "Identity Management"),
            ("Level", "2"),
            ("Taxonomy Classification", "Security"),
            ("Owner", ""),
        ]);
        let graph: FieldMap = [
            ("Taxonomy Classification", "Legacy"),
            ("Owner", "Platform Team"),
            ("Level", "1"),
        ]
        .into_iter()
        .collect();

        let record = merge_record(&config, &row, &graph, None);
        assert_eq!(record.get("Taxonomy Classification"), "Security");
        assert_eq!(record.get("Level"), "2");
        assert_eq!(record.get("Owner"), "Platform Team");
        assert_eq!(record.sequence(), Some(3));
    }

    #[test]
    fn test_graph_tier_does_not_clobber_sheet() {
        let config = SyncConfig::default();
        let row = row(&[("Name", "Payments"), ("Owner", "Alice")]);
        let graph: FieldMap = [("Owner", "Bob"), ("Parent", "Finance")].into_iter().collect();
        let record = merge_record(&config, &row, &graph, None);
        assert_eq!(record.get("Owner"), "Alice");
        assert_eq!(record.get("Parent"), "Finance");
    }

    #[test]
    fn test_dynamic_tier_overwrites() {
        let config = SyncConfig::default();
        let row = row(&[("Name", "Payments"), ("Owner", "Alice")]);
        let dynamic: FieldMap = [("Owner", "Carol"), ("Unrecognized", "x")].into_iter().collect();
        let record = merge_record(&config, &row, &FieldMap::new(), Some(&dynamic));
        assert_eq!(record.get("Owner"), "Carol");
        assert!(!record.fields.contains_key("Unrecognized"));
    }

    #[test]
    fn test_renamed_columns() {
        let mut config = SyncConfig::default();
        config
            .columns
            .rename
            .insert("Capability".to_string(), "Name".to_string());
        config
            .columns
            .rename
            .insert("Taxonomy".to_string(), "Taxonomy Classification".to_string());
        let row = row(&[("Capability", "Payments"), ("Taxonomy", "Customer")]);
        let graph: FieldMap = [("Taxonomy Classification", "Legacy")].into_iter().collect();
        let record = merge_record(&config, &row, &graph, None);
        assert_eq!(record.get("Name"), "Payments");
        assert_eq!(record.get("Taxonomy Classification"), "Customer");
    }

    #[test]
    fn test_columns_outside_sheet_subset_ignored() {
        let config = SyncConfig::default();
        let row = row(&[("Name", "Payments"), ("Parent", "Typed In Sheet")]);
        let graph: FieldMap = [("Parent", "Finance")].into_iter().collect();
        let record = merge_record(&config, &row, &graph, None);
        assert_eq!(record.get("Parent"), "Finance");
    }
}
