//! Delimited-text codecs for the tabular side of a sync.

pub mod reader;
pub mod writer;

pub use reader::{column_index, read_grid, read_grid_from, read_input, read_records_from};
pub use writer::{write_csv, write_records};

/// Delimiter shared by reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvFormat {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}
