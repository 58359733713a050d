//! CSV writing of merged records.
//!
//! Every field is quoted and embedded quotes are doubled. A header with no
//! value on a record is written as an empty field, never dropped.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use super::CsvFormat;
use crate::error::SyncResult;
use crate::model::MergedRecord;

/// Write `records` under `headers` to any writer.
pub fn write_records<W: Write>(
    output: W,
    headers: &[String],
    records: &[MergedRecord],
    format: CsvFormat,
) -> SyncResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .quote_style(csv::QuoteStyle::Always)
        .double_quote(true)
        .from_writer(output);

    writer.write_record(headers)?;
    for record in records {
        writer.write_record(headers.iter().map(|h| record.get(h)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `records` to a CSV file, replacing it.
pub fn write_csv(path: &Path, headers: &[String], records: &[MergedRecord], format: CsvFormat) -> SyncResult<()> {
    let file = File::create(path)?;
    write_records(file, headers, records, format)?;
    info!(path = %path.display(), records = records.len(), "Wrote merged records");
    Ok(())
}
