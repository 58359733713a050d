//! Centralized error types for modelsync.

use thiserror::Error;

/// Main error type for reconciliation operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A record or source is missing something it must carry.
    /// Fatal to the entity, not to the batch.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A folder, node or view was expected but not found.
    #[error("Not found: {0}")]
    Lookup(String),

    /// The store rejected a create or set operation.
    #[error("Mutation failed for '{entity}': {message}")]
    Mutation { entity: String, message: String },

    /// The tabular payload has a shape that cannot be interpreted.
    #[error("Unsupported input shape: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a lookup failure.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a mutation failure tagged with the entity it concerns.
    pub fn mutation(entity: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Mutation {
            entity: entity.into(),
            message: msg.into(),
        }
    }

    /// Create a shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error only concerns a single entity and the batch may continue.
    pub fn is_entity_scoped(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Lookup(_) | Self::Mutation { .. }
        )
    }
}
