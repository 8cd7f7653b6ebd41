//! Table catalog
//!
//! Maps normalized table names to tables. Callers may address a table by
//! its bare name (`players`) or its prefixed name (`tbl_players`), in any
//! letter case.

use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::models::Table;
use crate::utils::StringUtils;

/// Name -> table registry
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    prefix: String,
    tables: HashMap<String, Table>,
    order: Vec<String>,
}

impl TableCatalog {
    /// Create an empty catalog using `prefix` as the naming convention
    pub fn new(prefix: &str) -> Self {
        TableCatalog {
            prefix: StringUtils::normalize_identifier(prefix),
            tables: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Canonical form of a table name
    pub fn normalize(&self, name: &str) -> String {
        StringUtils::ensure_starts_with(&StringUtils::normalize_identifier(name), &self.prefix)
    }

    /// Canonical name without the prefix
    pub fn bare_name(&self, name: &str) -> String {
        let normalized = self.normalize(name);
        StringUtils::strip_prefix(&normalized, &self.prefix).to_string()
    }

    /// Register a table under its own (already normalized) name
    pub fn register(&mut self, table: Table) -> Result<()> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(StoreError::TableExists(name));
        }
        self.order.push(name.clone());
        self.tables.insert(name, table);
        Ok(())
    }

    /// Get a table by any accepted spelling of its name
    pub fn get(&self, name: &str) -> Result<&Table> {
        let key = self.normalize(name);
        self.tables.get(&key).ok_or(StoreError::TableNotFound(key))
    }

    /// Get a table mutably by any accepted spelling of its name
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        let key = self.normalize(name);
        self.tables.get_mut(&key).ok_or(StoreError::TableNotFound(key))
    }

    /// Check if the catalog has a table
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&self.normalize(name))
    }

    /// Normalized table names in definition order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no table is defined
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
