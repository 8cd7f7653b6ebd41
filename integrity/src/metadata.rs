//! Integrity metadata
//!
//! Per-table declarations of primary key, foreign keys, display derivation
//! and expected children. Declarations are checked against the catalog when
//! they are registered, so a cascade never discovers a bad reference half
//! way through.

use std::collections::{BTreeMap, HashMap};
use serde::{Serialize, Deserialize};
use log::{info, warn};

use relstore_core::{Database, Row, Schema, ID_COLUMN};

use crate::error::{IntegrityError, Result};

fn default_separator() -> String {
    " ".to_string()
}

/// How a row renders as a human-readable label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplaySpec {
    /// The text of one field
    Field(String),

    /// The texts of several fields joined by a separator
    Composite {
        /// Fields in rendering order
        fields: Vec<String>,
        /// Text placed between fields
        #[serde(default = "default_separator")]
        separator: String,
    },
}

impl DisplaySpec {
    /// Display a single field
    pub fn field(name: &str) -> Self {
        DisplaySpec::Field(name.to_string())
    }

    /// Display several fields joined by `separator`
    pub fn composite(fields: &[&str], separator: &str) -> Self {
        DisplaySpec::Composite {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            separator: separator.to_string(),
        }
    }

    /// Fields the derivation reads
    pub fn fields(&self) -> Vec<&str> {
        match self {
            DisplaySpec::Field(field) => vec![field.as_str()],
            DisplaySpec::Composite { fields, .. } => fields.iter().map(String::as_str).collect(),
        }
    }

    /// Render a row; fields missing from the schema render empty
    pub fn render(&self, schema: &Schema, row: &Row) -> String {
        let text = |field: &str| {
            schema
                .position(field)
                .and_then(|p| row.get(p))
                .map(ToString::to_string)
                .unwrap_or_default()
        };

        match self {
            DisplaySpec::Field(field) => text(field),
            DisplaySpec::Composite { fields, separator } => fields
                .iter()
                .map(|f| text(f))
                .collect::<Vec<_>>()
                .join(separator),
        }
    }
}

/// Integrity declaration for one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableMetadata {
    /// Primary-key column; the identity column when absent
    pub primary_key: Option<String>,

    /// Foreign-key column -> referenced table
    pub foreign_keys: BTreeMap<String, String>,

    /// Display derivation
    pub display: Option<DisplaySpec>,

    /// Tables expected to reference this one.
    ///
    /// Informational: cascades follow declared foreign keys only. See
    /// [`MetadataRegistry::unlinked_children`] for declarations that no
    /// foreign key backs.
    pub children: Vec<String>,
}

impl TableMetadata {
    /// Empty declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary-key column
    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key = Some(column.to_string());
        self
    }

    /// Declare that `column` references `target`
    pub fn foreign_key(mut self, column: &str, target: &str) -> Self {
        self.foreign_keys.insert(column.to_string(), target.to_string());
        self
    }

    /// Set the display derivation
    pub fn display(mut self, display: DisplaySpec) -> Self {
        self.display = Some(display);
        self
    }

    /// Declare an expected child table
    pub fn child(mut self, table: &str) -> Self {
        self.children.push(table.to_string());
        self
    }
}

/// A validated foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing column
    pub column: String,
    /// Normalized referenced table
    pub target: String,
}

/// An incoming edge of the foreign-key graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Normalized referencing table
    pub table: String,
    /// Referencing column
    pub column: String,
}

/// Validated metadata of one table, names normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    /// Normalized table name
    pub table: String,
    /// Primary-key column
    pub primary_key: String,
    /// Outgoing foreign keys, ordered by column
    pub foreign_keys: Vec<ForeignKey>,
    /// Display derivation
    pub display: Option<DisplaySpec>,
    /// Normalized expected children
    pub children: Vec<String>,
}

/// Registry of integrity metadata plus the reverse foreign-key graph
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: HashMap<String, ResolvedMetadata>,
    referenced_by: HashMap<String, Vec<Reference>>,
}

impl MetadataRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `metadata` against the tables of `db` and register it.
    ///
    /// Fails with a Configuration error, registering nothing, if the table,
    /// its primary key, a foreign-key column, a referenced table, a display
    /// field or a declared child does not exist. Registering a table again
    /// replaces its previous declaration.
    pub fn register(&mut self, db: &Database, table: &str, metadata: TableMetadata) -> Result<()> {
        let resolved = Self::resolve(db, table, metadata)?;
        let name = resolved.table.clone();

        for references in self.referenced_by.values_mut() {
            references.retain(|r| r.table != name);
        }
        for fk in &resolved.foreign_keys {
            self.referenced_by
                .entry(fk.target.clone())
                .or_default()
                .push(Reference {
                    table: name.clone(),
                    column: fk.column.clone(),
                });
        }

        info!(
            "Registered metadata for {}: primary key {}, {} foreign keys",
            name,
            resolved.primary_key,
            resolved.foreign_keys.len()
        );
        self.entries.insert(name, resolved);
        Ok(())
    }

    fn resolve(db: &Database, table: &str, metadata: TableMetadata) -> Result<ResolvedMetadata> {
        let name = db.normalize(table);
        let schema = db
            .table(&name)
            .map_err(|_| IntegrityError::Configuration(format!("metadata declared for unknown table {}", name)))?
            .schema();

        let primary_key = metadata.primary_key.unwrap_or_else(|| ID_COLUMN.to_string());
        if !schema.has_column(&primary_key) {
            return Err(IntegrityError::Configuration(format!(
                "primary key {} does not exist in table {}",
                primary_key, name
            )));
        }
        if primary_key != ID_COLUMN {
            let covered = db
                .table(&name)?
                .unique_indexes()
                .iter()
                .any(|i| i.columns().len() == 1 && i.columns()[0] == primary_key);
            if !covered {
                warn!("Primary key {}.{} has no unique constraint", name, primary_key);
            }
        }

        let mut foreign_keys = Vec::with_capacity(metadata.foreign_keys.len());
        for (column, target) in metadata.foreign_keys {
            if !schema.has_column(&column) {
                return Err(IntegrityError::Configuration(format!(
                    "foreign key column {} does not exist in table {}",
                    column, name
                )));
            }
            if column == ID_COLUMN {
                return Err(IntegrityError::Configuration(format!(
                    "identity column of {} cannot be a foreign key",
                    name
                )));
            }
            let target = db.normalize(&target);
            if db.table(&target).is_err() {
                return Err(IntegrityError::Configuration(format!(
                    "foreign key {}.{} references unknown table {}",
                    name, column, target
                )));
            }
            foreign_keys.push(ForeignKey { column, target });
        }

        if let Some(display) = &metadata.display {
            for field in display.fields() {
                if !schema.has_column(field) {
                    return Err(IntegrityError::Configuration(format!(
                        "display field {} does not exist in table {}",
                        field, name
                    )));
                }
            }
        }

        let mut children = Vec::with_capacity(metadata.children.len());
        for child in &metadata.children {
            let child = db.normalize(child);
            if db.table(&child).is_err() {
                return Err(IntegrityError::Configuration(format!(
                    "child table {} of {} does not exist",
                    child, name
                )));
            }
            children.push(child);
        }

        Ok(ResolvedMetadata {
            table: name,
            primary_key,
            foreign_keys,
            display: metadata.display,
            children,
        })
    }

    /// Metadata of a table, by normalized name
    pub fn get(&self, table: &str) -> Option<&ResolvedMetadata> {
        self.entries.get(table)
    }

    /// Primary-key column of a table; the identity column if undeclared
    pub fn primary_key(&self, table: &str) -> &str {
        self.entries
            .get(table)
            .map(|m| m.primary_key.as_str())
            .unwrap_or(ID_COLUMN)
    }

    /// Outgoing foreign keys of a table
    pub fn foreign_keys(&self, table: &str) -> &[ForeignKey] {
        self.entries
            .get(table)
            .map(|m| m.foreign_keys.as_slice())
            .unwrap_or(&[])
    }

    /// Incoming edges: every (table, column) referencing `table`
    pub fn referencing(&self, table: &str) -> &[Reference] {
        self.referenced_by
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared (parent, child) pairs where the child has no foreign key
    /// referencing the parent, in parent name order
    pub fn unlinked_children(&self) -> Vec<(String, String)> {
        let mut parents: Vec<&ResolvedMetadata> = self.entries.values().collect();
        parents.sort_by(|a, b| a.table.cmp(&b.table));

        let mut unlinked = Vec::new();
        for parent in parents {
            for child in &parent.children {
                if !self.referencing(&parent.table).iter().any(|r| &r.table == child) {
                    unlinked.push((parent.table.clone(), child.clone()));
                }
            }
        }
        unlinked
    }

    /// Display derivation of a table
    pub fn display(&self, table: &str) -> Option<&DisplaySpec> {
        self.entries.get(table).and_then(|m| m.display.as_ref())
    }

    /// Number of tables with metadata
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no metadata is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
