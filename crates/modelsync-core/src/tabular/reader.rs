//! CSV reading into grids or keyed rows.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::CsvFormat;
use crate::error::SyncResult;
use crate::model::FieldMap;
use crate::normalize::TabularInput;

/// Read every row as raw cells, headers included. Rows may differ in width.
pub fn read_grid_from<R: Read>(input: R, format: CsvFormat) -> SyncResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read a CSV file as raw cells.
pub fn read_grid(path: &Path, format: CsvFormat) -> SyncResult<Vec<Vec<String>>> {
    let rows = read_grid_from(File::open(path)?, format)?;
    debug!(path = %path.display(), rows = rows.len(), "Read tabular grid");
    Ok(rows)
}

/// Read rows keyed by a single header row.
pub fn read_records_from<R: Read>(input: R, format: CsvFormat) -> SyncResult<Vec<FieldMap>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields: FieldMap = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(fields);
    }
    Ok(rows)
}

/// Read a source file into the input shape the normalizer expects.
///
/// With one header row the file is read as keyed rows; otherwise as a grid
/// whose leading `header_rows` rows the normalizer drops.
pub fn read_input(path: &Path, format: CsvFormat, header_rows: usize) -> SyncResult<TabularInput> {
    if header_rows == 1 {
        return Ok(TabularInput::Records(read_records_from(File::open(path)?, format)?));
    }
    Ok(TabularInput::Grid(read_grid(path, format)?))
}

/// Position of a column in a header row.
pub fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_grid_flexible_widths() {
        let data = "Title\nName,Owner\nPayments,Alice\nLending\n";
        let rows = read_grid_from(data.as_bytes(), CsvFormat::default()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], vec!["Name".to_string(), "Owner".to_string()]);
        assert_eq!(rows[3], vec!["Lending".to_string()]);
    }

    #[test]
    fn test_read_records_keyed() {
        let data = "Name;Owner\nPayments;Alice\n";
        let rows = read_records_from(data.as_bytes(), CsvFormat::with_delimiter(b';')).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Owner"), Some("Alice"));
    }

    #[test]
    fn test_column_index() {
        let headers = vec!["Name".to_string(), " Owner ".to_string()];
        assert_eq!(column_index(&headers, "Owner"), Some(1));
        assert_eq!(column_index(&headers, "Level"), None);
    }
}
