//! Row normalization.
//!
//! Tabular payloads arrive in one of three shapes. The shape is resolved once,
//! into [`TabularInput`], and [`normalize_rows`] turns any of them into an
//! ordered sequence of [`SourceRow`]s.

use serde_json::Value;

use crate::error::{SyncError, SyncResult};
use crate::model::{FieldMap, SourceRow};

/// Default number of leading grid rows (title and header) to drop.
pub const DEFAULT_HEADER_ROWS: usize = 2;

/// A raw tabular payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabularInput {
    /// Rows of cells, led by a title row and a header row.
    Grid(Vec<Vec<String>>),
    /// Rows already keyed by column name.
    Records(Vec<FieldMap>),
    /// A single keyed row.
    Single(FieldMap),
}

impl TabularInput {
    /// Resolve a loosely typed JSON payload.
    ///
    /// An array is classified by its first element; an empty array is zero
    /// rows. Any other top-level value is a shape error.
    pub fn from_json(value: Value) -> SyncResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::Single(object_to_fields(map))),
            Value::Array(items) => match items.first() {
                None => Ok(Self::Records(Vec::new())),
                Some(Value::Object(_)) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(map) => Ok(object_to_fields(map)),
                        other => Err(SyncError::shape(format!(
                            "row {} is {} in an array of objects",
                            i + 1,
                            type_name(&other)
                        ))),
                    })
                    .collect::<SyncResult<Vec<_>>>()
                    .map(Self::Records),
                Some(Value::Array(_)) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Array(cells) => Ok(cells.iter().map(cell_text).collect()),
                        other => Err(SyncError::shape(format!(
                            "row {} is {} in an array of rows",
                            i + 1,
                            type_name(&other)
                        ))),
                    })
                    .collect::<SyncResult<Vec<_>>>()
                    .map(Self::Grid),
                Some(other) => Err(SyncError::shape(format!(
                    "array of {} is not a table",
                    type_name(other)
                ))),
            },
            other => Err(SyncError::shape(format!(
                "expected an array or object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Column names, from the header row of a grid or the keys of the first record.
    pub fn headers(&self, header_rows: usize) -> Vec<String> {
        match self {
            Self::Grid(rows) => header_rows
                .checked_sub(1)
                .and_then(|i| rows.get(i))
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .map(|(i, h)| column_name(h, i))
                        .collect()
                })
                .unwrap_or_default(),
            Self::Records(rows) => rows
                .first()
                .map(|r| r.keys().map(str::to_string).collect())
                .unwrap_or_default(),
            Self::Single(row) => row.keys().map(str::to_string).collect(),
        }
    }
}

/// Turn any input shape into ordered rows.
///
/// Grid rows get the spreadsheet row number as sequence (position after the
/// dropped rows plus the drop count). Keyed rows get their 1-based position.
pub fn normalize_rows(input: TabularInput, header_rows: usize) -> Vec<SourceRow> {
    match input {
        TabularInput::Records(rows) => rows
            .into_iter()
            .enumerate()
            .map(|(i, fields)| SourceRow::new(fields, i + 1))
            .collect(),
        TabularInput::Single(fields) => vec![SourceRow::new(fields, 1)],
        TabularInput::Grid(rows) => {
            let headers: Vec<String> = header_rows
                .checked_sub(1)
                .and_then(|i| rows.get(i))
                .map(|row| row.iter().enumerate().map(|(i, h)| column_name(h, i)).collect())
                .unwrap_or_default();

            rows.into_iter()
                .skip(header_rows)
                .enumerate()
                .map(|(i, cells)| {
                    let width = headers.len().max(cells.len());
                    let mut fields = FieldMap::new();
                    for col in 0..width {
                        let name = headers
                            .get(col)
                            .cloned()
                            .unwrap_or_else(|| column_name("", col));
                        let value = cells.get(col).cloned().unwrap_or_default();
                        fields.insert(name, value);
                    }
                    SourceRow::new(fields, i + 1 + header_rows)
                })
                .collect()
        }
    }
}

/// Required columns absent from `headers`, as a validation error.
pub fn check_required_columns(headers: &[String], required: &[String]) -> SyncResult<()> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|r| !headers.iter().any(|h| h == *r))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SyncError::validation(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

/// Required columns that are empty on a row.
pub fn missing_required_values<'a>(row: &SourceRow, required: &'a [String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|col| row.fields.value(col).trim().is_empty())
        .map(String::as_str)
        .collect()
}

fn column_name(header: &str, index: usize) -> String {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        format!("Column {}", index + 1)
    } else {
        trimmed.to_string()
    }
}

fn object_to_fields(map: serde_json::Map<String, Value>) -> FieldMap {
    map.iter().map(|(k, v)| (k.clone(), cell_text(v))).collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
