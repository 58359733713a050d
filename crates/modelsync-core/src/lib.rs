//! # modelsync core
//!
//! Store-independent parts of the reconciliation pipeline: the data model,
//! configuration, row normalization, property merging, reference codes,
//! identity assignment and the CSV codecs.

pub mod codes;
pub mod config;
pub mod error;
pub mod identity;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod tabular;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use normalize::{normalize_rows, TabularInput};
