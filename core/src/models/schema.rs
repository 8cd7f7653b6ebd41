//! Column schema
//!
//! An ordered list of distinct column names. Position 0 is always the
//! identity column.

use std::collections::HashMap;

use crate::error::{Result, StoreError};
use super::row::{Fields, Row};

/// Name of the identity column every table starts with
pub const ID_COLUMN: &str = "id";

/// Ordered column names of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Schema {
    /// Create a schema, checking the identity column and name uniqueness
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();

        match columns.first() {
            Some(first) if first == ID_COLUMN => {}
            Some(first) => {
                return Err(StoreError::InvalidSchema(format!(
                    "first column must be {}, found {}",
                    ID_COLUMN, first
                )))
            }
            None => {
                return Err(StoreError::InvalidSchema(
                    "a table needs at least the identity column".to_string(),
                ))
            }
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if column.is_empty() {
                return Err(StoreError::InvalidSchema(format!(
                    "column {} has an empty name",
                    position
                )));
            }
            if positions.insert(column.clone(), position).is_some() {
                return Err(StoreError::InvalidSchema(format!(
                    "duplicate column {}",
                    column
                )));
            }
        }

        Ok(Schema { columns, positions })
    }

    /// Position of a column
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Check if the schema has a column
    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns, identity included
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a schema holds at least the identity column
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Name the values of a row by this schema
    pub fn fields_of(&self, row: &Row) -> Fields {
        self.columns
            .iter()
            .cloned()
            .zip(row.values().iter().cloned())
            .collect()
    }
}
