//! Display derivation
//!
//! Presentation-only labels computed from stored rows. Nothing here writes
//! to the database.

use std::collections::BTreeMap;
use serde::Serialize;

use relstore_core::{fields, Database, Row, Value, ID_COLUMN};

use crate::error::Result;
use crate::metadata::MetadataRegistry;

/// A row with its derived labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    /// Stored fields by column
    pub fields: BTreeMap<String, Value>,

    /// Label of the referenced row, per non-null foreign-key column
    pub labels: BTreeMap<String, String>,

    /// The row's own label, if its table declares a display derivation
    pub display: Option<String>,
}

/// Own label of a row of `table` (normalized)
pub fn label_of(db: &Database, registry: &MetadataRegistry, table: &str, row: &Row) -> Result<Option<String>> {
    let schema = db.table(table)?.schema();
    Ok(registry.display(table).map(|spec| spec.render(schema, row)))
}

/// Derive the labels of `row`, a row of `table` (normalized)
pub fn resolve_display(db: &Database, registry: &MetadataRegistry, table: &str, row: &Row) -> Result<DisplayRow> {
    let schema = db.table(table)?.schema();
    let fields: BTreeMap<String, Value> = schema.fields_of(row).into_iter().collect();

    let mut labels = BTreeMap::new();
    for fk in registry.foreign_keys(table) {
        let value = match fields.get(&fk.column) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };

        let primary_key = registry.primary_key(&fk.target);
        let target = if primary_key == ID_COLUMN {
            match value.as_integer() {
                Some(id) => db.get(&fk.target, id)?,
                None => None,
            }
        } else {
            db.find(&fk.target, &fields! { primary_key => value.clone() })?
                .into_iter()
                .next()
        };

        // The referenced row may be gone after a raw delete
        if let Some(target) = target {
            let label = label_of(db, registry, &fk.target, &target)?
                .unwrap_or_else(|| format!("#{}", value));
            labels.insert(fk.column.clone(), label);
        }
    }

    Ok(DisplayRow {
        display: label_of(db, registry, table, row)?,
        fields,
        labels,
    })
}
