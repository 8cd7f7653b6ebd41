//! Error types for the integrity layer

use relstore_core::{StoreError, Value};
use thiserror::Error;

/// Integrity layer error type
#[derive(Error, Debug)]
pub enum IntegrityError {
    /// Error raised by the underlying store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A non-null foreign key points at a row that does not exist
    #[error("Foreign key {table}.{column} references missing {target} row {value}")]
    ForeignKeyViolation {
        /// Table being written
        table: String,
        /// Foreign-key column
        column: String,
        /// Referenced table
        target: String,
        /// Value that matched no row
        value: Value,
    },

    /// Metadata references a table or column that does not exist
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A table or row required by the operation is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// A cascade delete stopped part way; earlier deletions are not undone
    #[error("Cascade delete interrupted after removing {deleted} rows: {source}")]
    CascadeInterrupted {
        /// Rows removed before the failure
        deleted: usize,
        /// The failure
        source: Box<IntegrityError>,
    },
}

impl IntegrityError {
    /// Whether this is a unique-constraint violation from the store
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, IntegrityError::Store(StoreError::UniqueViolation { .. }))
    }

    /// Whether this is a foreign-key violation
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, IntegrityError::ForeignKeyViolation { .. })
    }
}

/// Result type for the integrity crate
pub type Result<T> = std::result::Result<T, IntegrityError>;

/// Convert a displayable error into a Configuration error
pub fn to_config_error<E: std::fmt::Display>(err: E) -> IntegrityError {
    IntegrityError::Configuration(err.to_string())
}
