//! Orphan cleanup hooks
//!
//! Hooks run after a cascade delete completes. They are best effort: a
//! failing hook is logged and does not fail the delete that triggered it.

use log::debug;

use relstore_core::{fields, Database};

use crate::error::Result;
use crate::metadata::MetadataRegistry;

/// Cleanup pass run after every cascade delete
pub trait OrphanHook: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Remove whatever the hook considers orphaned; returns rows removed
    fn cleanup(&mut self, db: &mut Database, registry: &MetadataRegistry) -> Result<usize>;
}

/// Deletes rows of an auxiliary table that no foreign key references
#[derive(Debug, Clone)]
pub struct UnreferencedRows {
    table: String,
    name: String,
}

impl UnreferencedRows {
    /// Clean up `table`; the name may use any accepted spelling
    pub fn new(table: &str) -> Self {
        UnreferencedRows {
            table: table.to_string(),
            name: format!("unreferenced rows of {}", table),
        }
    }
}

impl OrphanHook for UnreferencedRows {
    fn name(&self) -> &str {
        &self.name
    }

    fn cleanup(&mut self, db: &mut Database, registry: &MetadataRegistry) -> Result<usize> {
        let table = db.normalize(&self.table);
        let references = registry.referencing(&table);
        let position = db
            .table(&table)?
            .schema()
            .position(registry.primary_key(&table))
            .unwrap_or(0);

        let mut orphans = Vec::new();
        for row in db.find(&table, &fields! {})? {
            let key = row.get(position).cloned().unwrap_or_default();
            let mut referenced = false;
            for reference in references {
                let filter = fields! { reference.column.as_str() => key.clone() };
                if !db.find(&reference.table, &filter)?.is_empty() {
                    referenced = true;
                    break;
                }
            }
            if !referenced {
                orphans.push(row.id());
            }
        }

        for id in &orphans {
            db.delete(&table, *id)?;
        }
        debug!("Removed {} unreferenced rows from {}", orphans.len(), table);
        Ok(orphans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TableMetadata;

    #[test]
    fn test_unreferenced_rows_are_removed() {
        let mut db = Database::new();
        db.define_table("tags", &["id", "label"], &[]).unwrap();
        db.define_table("posts", &["id", "tag_id"], &[]).unwrap();
        let mut registry = MetadataRegistry::new();
        registry
            .register(&db, "posts", TableMetadata::new().foreign_key("tag_id", "tags"))
            .unwrap();

        let used = db.create("tags", &fields! { "label" => "rust" }).unwrap();
        let unused = db.create("tags", &fields! { "label" => "cobol" }).unwrap();
        db.create("posts", &fields! { "tag_id" => used }).unwrap();

        let mut hook = UnreferencedRows::new("tags");
        assert_eq!(hook.cleanup(&mut db, &registry).unwrap(), 1);
        assert!(db.get("tags", used).unwrap().is_some());
        assert!(db.get("tags", unused).unwrap().is_none());
        assert_eq!(hook.name(), "unreferenced rows of tags");
    }

    #[test]
    fn test_unknown_table_fails() {
        let mut db = Database::new();
        let registry = MetadataRegistry::new();
        assert!(UnreferencedRows::new("ghosts").cleanup(&mut db, &registry).is_err());
    }
}
