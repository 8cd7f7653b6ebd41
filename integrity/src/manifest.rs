//! Store manifest
//!
//! A JSON document declaring a whole store: configuration, tables, views
//! and integrity metadata. Metadata is keyed by table name and validated
//! when the store is built, after every table and view exists.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use relstore_core::{StoreConfig, TableDefinition, ViewDefinition};

use crate::error::{to_config_error, IntegrityError, Result};
use crate::metadata::TableMetadata;

/// Declarative description of a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Store configuration
    pub config: StoreConfig,
    /// Tables, defined in order
    pub tables: Vec<TableDefinition>,
    /// Named views
    pub views: BTreeMap<String, ViewDefinition>,
    /// Integrity metadata per table
    pub metadata: BTreeMap<String, TableMetadata>,
}

impl Manifest {
    /// Parse a manifest from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(to_config_error)
    }

    /// Load a manifest from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            to_config_error(format!("cannot read manifest {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Write the manifest as pretty JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(to_config_error)?;
        fs::write(path, text).map_err(to_config_error)
    }
}

impl FromStr for Manifest {
    type Err = IntegrityError;

    fn from_str(text: &str) -> Result<Self> {
        Self::from_json(text)
    }
}
