//! Foreign-key validation
//!
//! Checks candidate writes before they reach storage, so a rejected write
//! has no side effects.

use log::debug;

use relstore_core::{fields, Database, Fields, Value, ID_COLUMN};

use crate::error::{IntegrityError, Result};
use crate::metadata::MetadataRegistry;

/// Foreign-key validator
#[derive(Debug, Clone)]
pub struct ForeignKeyValidator;

impl ForeignKeyValidator {
    /// Validate the foreign-key columns present in `fields`.
    ///
    /// `table` is a normalized name. Null or absent values are always
    /// valid; any other value must match the primary key of a live row in
    /// the referenced table.
    pub fn validate(db: &Database, registry: &MetadataRegistry, table: &str, fields: &Fields) -> Result<()> {
        for fk in registry.foreign_keys(table) {
            let value = match fields.get(&fk.column) {
                Some(value) if !value.is_null() => value,
                _ => continue,
            };

            if !Self::target_exists(db, registry, &fk.target, value)? {
                debug!("Rejected write to {}: {} = {} has no target", table, fk.column, value);
                return Err(IntegrityError::ForeignKeyViolation {
                    table: table.to_string(),
                    column: fk.column.clone(),
                    target: fk.target.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether `target` has a live row whose primary key equals `value`
    pub fn target_exists(db: &Database, registry: &MetadataRegistry, target: &str, value: &Value) -> Result<bool> {
        let primary_key = registry.primary_key(target);
        if primary_key == ID_COLUMN {
            return Ok(match value.as_integer() {
                Some(id) => db.table(target)?.contains(id),
                None => false,
            });
        }
        Ok(!db.find(target, &fields! { primary_key => value.clone() })?.is_empty())
    }
}
