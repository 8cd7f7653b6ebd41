//! Validated store
//!
//! Wraps the raw [`Database`] with integrity metadata: writes are checked
//! against foreign keys before they reach storage, and deletes cascade to
//! every dependent row.

use log::{debug, warn};

use relstore_core::{
    import::{self, ImportReport, RowSink},
    Database, Fields, ResultSet, Row, StoreConfig, TableDefinition, ViewDefinition,
};

use crate::cascade::{CascadePlan, CascadeReport, CascadeResolver};
use crate::display::{self, DisplayRow};
use crate::error::{IntegrityError, Result};
use crate::hooks::OrphanHook;
use crate::manifest::Manifest;
use crate::metadata::{MetadataRegistry, TableMetadata};
use crate::validator::ForeignKeyValidator;

/// Database plus integrity metadata and cleanup hooks
pub struct Store {
    db: Database,
    registry: MetadataRegistry,
    hooks: Vec<Box<dyn OrphanHook>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("db", &self.db)
            .field("registry", &self.registry)
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store with the default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store
    pub fn with_config(config: StoreConfig) -> Self {
        Store {
            db: Database::with_config(config),
            registry: MetadataRegistry::new(),
            hooks: Vec::new(),
        }
    }

    /// Build a store from a manifest: tables, then views, then metadata
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        let mut store = Self::with_config(manifest.config);
        for table in &manifest.tables {
            store.define(table)?;
        }
        for (name, view) in manifest.views {
            store.define_view(&name, view)?;
        }
        for (table, metadata) in manifest.metadata {
            store.define_metadata(&table, metadata)?;
        }
        for (parent, child) in store.registry.unlinked_children() {
            warn!("{} is declared a child of {} but has no foreign key to it", child, parent);
        }
        Ok(store)
    }

    /// Raw database, for reads that bypass integrity checks
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Registered metadata
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Define a table; returns its normalized name
    pub fn define_table(&mut self, name: &str, columns: &[&str], unique: &[Vec<&str>]) -> Result<String> {
        Ok(self.db.define_table(name, columns, unique)?)
    }

    /// Define a table from its declaration; returns its normalized name
    pub fn define(&mut self, definition: &TableDefinition) -> Result<String> {
        Ok(self.db.define(definition)?)
    }

    /// Define a named view
    pub fn define_view(&mut self, name: &str, definition: ViewDefinition) -> Result<()> {
        Ok(self.db.define_view(name, definition)?)
    }

    /// Declare integrity metadata for a table
    pub fn define_metadata(&mut self, table: &str, metadata: TableMetadata) -> Result<()> {
        self.registry.register(&self.db, table, metadata)
    }

    /// Run `hook` after every cascade delete
    pub fn add_orphan_hook(&mut self, hook: Box<dyn OrphanHook>) {
        self.hooks.push(hook);
    }

    /// Create a row after validating its foreign keys
    pub fn create(&mut self, table: &str, fields: &Fields) -> Result<i64> {
        let table = self.db.normalize(table);
        ForeignKeyValidator::validate(&self.db, &self.registry, &table, fields)?;
        Ok(self.db.create(&table, fields)?)
    }

    /// All rows of a table
    pub fn read_all(&self, table: &str) -> Result<Vec<Row>> {
        self.read(table, &Fields::new())
    }

    /// Rows matching `filter`
    pub fn read(&self, table: &str, filter: &Fields) -> Result<Vec<Row>> {
        Ok(self.db.find(table, filter)?)
    }

    /// A row by identity
    pub fn get(&self, table: &str, id: i64) -> Result<Option<Row>> {
        Ok(self.db.get(table, id)?)
    }

    /// Update supplied columns after validating foreign keys.
    ///
    /// `Ok(false)` when the row does not exist; nothing is validated then.
    pub fn update(&mut self, table: &str, id: i64, fields: &Fields) -> Result<bool> {
        let table = self.db.normalize(table);
        if self.db.get(&table, id)?.is_none() {
            return Ok(false);
        }
        ForeignKeyValidator::validate(&self.db, &self.registry, &table, fields)?;
        Ok(self.db.update(&table, id, fields)?)
    }

    /// What deleting a row would remove, deepest first; `None` if absent
    pub fn plan_delete(&self, table: &str, id: i64) -> Result<Option<CascadePlan>> {
        CascadeResolver::new(&self.db, &self.registry).plan(table, id)
    }

    /// Delete a row and everything that depends on it, then run the
    /// orphan-cleanup hooks. Deleting a missing row removes nothing.
    pub fn delete(&mut self, table: &str, id: i64) -> Result<CascadeReport> {
        let plan = match self.plan_delete(table, id)? {
            Some(plan) => plan,
            None => {
                debug!("Delete of missing row {} in {} is a no-op", id, table);
                return Ok(CascadeReport::default());
            }
        };

        let mut report = CascadeResolver::execute(&mut self.db, &plan)?;
        for hook in &mut self.hooks {
            match hook.cleanup(&mut self.db, &self.registry) {
                Ok(removed) => report.orphans_removed += removed,
                Err(err) => warn!("Orphan cleanup '{}' failed: {}", hook.name(), err),
            }
        }
        Ok(report)
    }

    /// Derive presentation labels for a row of `table`
    pub fn resolve_display(&self, table: &str, row: &Row) -> Result<DisplayRow> {
        let table = self.db.normalize(table);
        display::resolve_display(&self.db, &self.registry, &table, row)
    }

    /// Compute the current rows of a view
    pub fn get_data(&self, view: &str) -> Result<ResultSet> {
        Ok(self.db.get_data(view)?)
    }

    /// Import line-format data through the validated create contract
    pub fn import(&mut self, text: &str) -> Result<ImportReport> {
        import::import_into(self, text)
    }
}

impl RowSink for Store {
    type Error = IntegrityError;

    fn insert_record(&mut self, table: &str, fields: &Fields) -> Result<i64> {
        self.create(table, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::UnreferencedRows;
    use relstore_core::{fields, Value};

    fn create_test_store() -> Store {
        let mut store = Store::new();
        store.define_table("players", &["id", "name"], &[vec!["name"]]).unwrap();
        store.define_table("games", &["id", "player1_id", "player2_id"], &[]).unwrap();
        store
            .define_metadata(
                "games",
                TableMetadata::new()
                    .foreign_key("player1_id", "players")
                    .foreign_key("player2_id", "players"),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_store_can_move_between_threads() {
        fn assert_send<T: Send>() {}
        assert_send::<Store>();
        assert_send::<Database>();
    }

    #[test]
    fn test_create_with_missing_target_creates_nothing() {
        let mut store = create_test_store();
        let err = store.create("games", &fields! { "player1_id" => 999 }).unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert!(store.read_all("games").unwrap().is_empty());
        assert_eq!(store.database().table("games").unwrap().next_id(), 1);
    }

    #[test]
    fn test_update_validates_and_ignores_missing_rows() {
        let mut store = create_test_store();
        let alice = store.create("players", &fields! { "name" => "Alice" }).unwrap();
        let game = store.create("games", &fields! { "player1_id" => alice }).unwrap();

        let err = store.update("games", game, &fields! { "player2_id" => 42 }).unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert_eq!(store.get("games", game).unwrap().unwrap().get(2), Some(&Value::Null));

        assert!(!store.update("games", 77, &fields! { "player2_id" => 42 }).unwrap());
        assert!(store.update("games", game, &fields! { "player2_id" => alice }).unwrap());
    }

    #[test]
    fn test_delete_missing_row_is_noop_missing_table_is_error() {
        let mut store = create_test_store();
        assert!(store.delete("players", 3).unwrap().is_empty());
        assert!(store.delete("ghosts", 3).is_err());
    }

    #[test]
    fn test_failing_hook_does_not_fail_delete() {
        struct Broken;
        impl OrphanHook for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn cleanup(&mut self, _db: &mut Database, _registry: &MetadataRegistry) -> Result<usize> {
                Err(IntegrityError::NotFound("nothing to clean".to_string()))
            }
        }

        let mut store = create_test_store();
        store.add_orphan_hook(Box::new(Broken));
        let alice = store.create("players", &fields! { "name" => "Alice" }).unwrap();
        let report = store.delete("players", alice).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.orphans_removed, 0);
    }

    #[test]
    fn test_orphan_hook_runs_after_cascade() {
        let mut store = create_test_store();
        store.define_table("venues", &["id", "city"], &[]).unwrap();
        store.define_table("bookings", &["id", "game_id", "venue_id"], &[]).unwrap();
        store
            .define_metadata(
                "bookings",
                TableMetadata::new()
                    .foreign_key("game_id", "games")
                    .foreign_key("venue_id", "venues"),
            )
            .unwrap();
        store.add_orphan_hook(Box::new(UnreferencedRows::new("venues")));

        let alice = store.create("players", &fields! { "name" => "Alice" }).unwrap();
        let game = store.create("games", &fields! { "player1_id" => alice }).unwrap();
        let venue = store.create("venues", &fields! { "city" => "Oslo" }).unwrap();
        store.create("bookings", &fields! { "game_id" => game, "venue_id" => venue }).unwrap();

        let report = store.delete("players", alice).unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.orphans_removed, 1);
        assert!(store.read_all("venues").unwrap().is_empty());
    }

    #[test]
    fn test_import_is_validated() {
        let mut store = create_test_store();
        let report = store
            .import("players|name\nAlice\nBob\n\ngames|player1_id|player2_id\n1|2\n")
            .unwrap();
        assert_eq!(report.len(), 3);

        let err = store.import("games|player1_id\n9\n").unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert_eq!(store.read_all("games").unwrap().len(), 1);
    }
}
