//! Error types for the core crate
//!
//! This module provides a consolidated error type for the row store,
//! table catalog, join views and bulk import.

use std::io;
use thiserror::Error;

/// Core store error type
#[derive(Error, Debug)]
pub enum StoreError {
    /// A create or update collided with a live row on a unique constraint
    #[error("Unique constraint ({}) violated in table {table}", columns.join(", "))]
    UniqueViolation {
        /// Table the write targeted
        table: String,
        /// Columns of the violated constraint
        columns: Vec<String>,
    },

    /// Table does not exist in the catalog
    #[error("Table {0} does not exist")]
    TableNotFound(String),

    /// Column does not exist in the table schema
    #[error("Column {column} does not exist in table {table}")]
    ColumnNotFound {
        /// Table that was addressed
        table: String,
        /// Unknown column name
        column: String,
    },

    /// Table was defined twice
    #[error("Table {0} already exists")]
    TableExists(String),

    /// Schema or unique constraint declaration is invalid
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// View declaration is invalid
    #[error("Invalid view: {0}")]
    InvalidView(String),

    /// View does not exist
    #[error("View {0} does not exist")]
    ViewNotFound(String),

    /// Import data could not be parsed
    #[error("Malformed input at line {line}: {message}")]
    MalformedInput {
        /// One-based line number in the import text
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error reports a missing table, column or view
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::TableNotFound(_)
                | StoreError::ColumnNotFound { .. }
                | StoreError::ViewNotFound(_)
        )
    }
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, StoreError>;

/// Build a ColumnNotFound error
pub fn column_not_found(table: &str, column: &str) -> StoreError {
    StoreError::ColumnNotFound {
        table: table.to_string(),
        column: column.to_string(),
    }
}

/// Build a MalformedInput error
pub fn malformed<E: std::fmt::Display>(line: usize, err: E) -> StoreError {
    StoreError::MalformedInput {
        line,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        match store_err {
            StoreError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }

        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let store_err: StoreError = json_err.into();
        match store_err {
            StoreError::Json(_) => {}
            _ => panic!("Expected Json variant"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::UniqueViolation {
            table: "tbl_games".to_string(),
            columns: vec!["x".to_string(), "y".to_string()],
        };
        assert_eq!(err.to_string(), "Unique constraint (x, y) violated in table tbl_games");

        let err = column_not_found("tbl_players", "rating");
        assert_eq!(err.to_string(), "Column rating does not exist in table tbl_players");
        assert!(err.is_not_found());

        let err = malformed(4, "expected 3 values, found 2");
        assert_eq!(err.to_string(), "Malformed input at line 4: expected 3 values, found 2");
        assert!(!err.is_not_found());
    }
}
