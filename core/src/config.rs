//! Configuration for the core crate
//!
//! This module provides configuration options for the store: table naming
//! and arena compaction.

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix every normalized table name carries
    pub table_prefix: String,

    /// Minimum number of deleted slots before a table compacts its arena
    pub compaction_threshold: usize,

    /// Log level for binaries embedding the store
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            table_prefix: "tbl_".to_string(),
            compaction_threshold: 64,
            log_level: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.log_level = "debug".to_string();
        config
    }

    /// Create a testing configuration; compacts eagerly
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.log_level = "debug".to_string();
        config.compaction_threshold = 2;
        config
    }
}
