//! Database facade
//!
//! Owns the table catalog and the view definitions and exposes raw,
//! unvalidated create/read/update/delete. Every read returns owned copies, so
//! later writes never alter results already handed out.

use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use log::{debug, info};

use crate::catalog::TableCatalog;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::import::{self, ImportReport, RowSink};
use crate::models::{Fields, Row, Table};
use crate::view::{JoinEngine, ResultSet, ViewDefinition};

/// Declaration of a table: columns and unique constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name, bare or prefixed
    pub name: String,

    /// Column names; the first must be the identity column
    pub columns: Vec<String>,

    /// Unique constraints, each a list of columns
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
}

impl TableDefinition {
    /// Create a definition without unique constraints
    pub fn new(name: &str, columns: &[&str]) -> Self {
        TableDefinition {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: Vec::new(),
        }
    }

    /// Add a unique constraint over `columns`
    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique.push(columns.iter().map(|c| c.to_string()).collect());
        self
    }
}

/// In-memory database: tables plus views
#[derive(Debug, Clone)]
pub struct Database {
    config: StoreConfig,
    catalog: TableCatalog,
    views: HashMap<String, ViewDefinition>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Create an empty database with the default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty database
    pub fn with_config(config: StoreConfig) -> Self {
        Database {
            catalog: TableCatalog::new(&config.table_prefix),
            views: HashMap::new(),
            config,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The table catalog
    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    /// Canonical form of a table name
    pub fn normalize(&self, name: &str) -> String {
        self.catalog.normalize(name)
    }

    /// Define a table; returns its normalized name
    pub fn define_table(&mut self, name: &str, columns: &[&str], unique: &[Vec<&str>]) -> Result<String> {
        let definition = unique
            .iter()
            .fold(TableDefinition::new(name, columns), |def, columns| def.unique(columns));
        self.define(&definition)
    }

    /// Define a table from its declaration; returns its normalized name
    pub fn define(&mut self, definition: &TableDefinition) -> Result<String> {
        let name = self.catalog.normalize(&definition.name);
        let table = Table::new(
            &name,
            &definition.columns,
            &definition.unique,
            self.config.compaction_threshold,
        )?;
        self.catalog.register(table)?;

        info!(
            "Defined table {} ({} columns, {} unique constraints)",
            name,
            definition.columns.len(),
            definition.unique.len()
        );
        Ok(name)
    }

    /// Get a table
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.catalog.get(name)
    }

    /// Normalized table names in definition order
    pub fn table_names(&self) -> Vec<String> {
        self.catalog.names().to_vec()
    }

    /// Create a row; returns the new identity
    pub fn create(&mut self, table: &str, fields: &Fields) -> Result<i64> {
        let table = self.catalog.get_mut(table)?;
        let id = table.insert(fields)?;
        debug!("Created row {} in {}", id, table.name());
        Ok(id)
    }

    /// Get a copy of a row by identity
    pub fn get(&self, table: &str, id: i64) -> Result<Option<Row>> {
        Ok(self.catalog.get(table)?.get(id).cloned())
    }

    /// Copies of the rows matching `filter`; an empty filter matches all
    pub fn find(&self, table: &str, filter: &Fields) -> Result<Vec<Row>> {
        self.catalog.get(table)?.find(filter)
    }

    /// Update supplied columns; `Ok(false)` if the row does not exist
    pub fn update(&mut self, table: &str, id: i64, fields: &Fields) -> Result<bool> {
        let table = self.catalog.get_mut(table)?;
        let updated = table.update(id, fields)?;
        if updated {
            debug!("Updated row {} in {}", id, table.name());
        }
        Ok(updated)
    }

    /// Delete a row; `Ok(false)` if the row does not exist
    pub fn delete(&mut self, table: &str, id: i64) -> Result<bool> {
        let table = self.catalog.get_mut(table)?;
        let deleted = table.delete(id).is_some();
        if deleted {
            debug!("Deleted row {} from {}", id, table.name());
        }
        Ok(deleted)
    }

    /// Define a named view; every table it joins must already exist
    pub fn define_view(&mut self, name: &str, definition: ViewDefinition) -> Result<()> {
        definition.validate(&self.catalog)?;
        info!("Defined view {} over {:?}", name, definition.tables);
        self.views.insert(name.to_string(), definition);
        Ok(())
    }

    /// Get a view definition
    pub fn view(&self, name: &str) -> Result<&ViewDefinition> {
        self.views
            .get(name)
            .ok_or_else(|| StoreError::ViewNotFound(name.to_string()))
    }

    /// Compute the current rows of a view
    pub fn get_data(&self, view: &str) -> Result<ResultSet> {
        JoinEngine::execute(&self.catalog, self.view(view)?)
    }

    /// Import line-format data through the raw create contract
    pub fn import(&mut self, text: &str) -> Result<ImportReport> {
        import::import_into(self, text)
    }
}

impl RowSink for Database {
    type Error = StoreError;

    fn insert_record(&mut self, table: &str, fields: &Fields) -> Result<i64> {
        self.create(table, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::models::Value;

    fn create_test_db() -> Database {
        let mut db = Database::with_config(StoreConfig::testing());
        db.define_table("players", &["id", "name"], &[vec!["name"]]).unwrap();
        db.define_table("games", &["id", "player1_id", "player2_id"], &[]).unwrap();
        db
    }

    #[test]
    fn test_define_table_normalizes_and_rejects_duplicates() {
        let mut db = create_test_db();
        assert_eq!(db.table_names(), vec!["tbl_players", "tbl_games"]);
        assert_eq!(db.table("Players").unwrap().name(), "tbl_players");

        let err = db.define_table("tbl_players", &["id"], &[]).unwrap_err();
        assert!(matches!(err, StoreError::TableExists(_)));

        let err = db.define_table("broken", &["name"], &[]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSchema(_)));
        assert!(db.table("broken").is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut db = create_test_db();
        let input = fields! { "name" => "Alice" };
        let id = db.create("players", &input).unwrap();

        let row = db.get("players", id).unwrap().unwrap();
        let stored = db.table("players").unwrap().schema().fields_of(&row);
        assert_eq!(stored["name"], input["name"]);
        assert_eq!(stored["id"], Value::Integer(id));
    }

    #[test]
    fn test_reads_are_snapshots() {
        let mut db = create_test_db();
        let id = db.create("players", &fields! { "name" => "Alice" }).unwrap();
        let before = db.get("players", id).unwrap().unwrap();

        db.update("players", id, &fields! { "name" => "Alicia" }).unwrap();
        assert_eq!(before.get(1), Some(&Value::from("Alice")));
        assert_eq!(db.get("players", id).unwrap().unwrap().get(1), Some(&Value::from("Alicia")));
    }

    #[test]
    fn test_missing_table_is_an_error_missing_row_is_not() {
        let mut db = create_test_db();
        assert!(matches!(db.get("nope", 1), Err(StoreError::TableNotFound(_))));
        assert!(matches!(db.delete("nope", 1), Err(StoreError::TableNotFound(_))));

        assert_eq!(db.get("players", 1).unwrap(), None);
        assert!(!db.update("players", 1, &fields! { "name" => "x" }).unwrap());
        assert!(!db.delete("players", 1).unwrap());
    }

    #[test]
    fn test_views_see_live_data() {
        let mut db = create_test_db();
        db.define_view(
            "games_with_player1",
            ViewDefinition::from_table("players").join("games", "id", "player1_id"),
        )
        .unwrap();

        assert!(db.get_data("games_with_player1").unwrap().is_empty());

        let alice = db.create("players", &fields! { "name" => "Alice" }).unwrap();
        db.create("games", &fields! { "player1_id" => alice }).unwrap();
        let data = db.get_data("games_with_player1").unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.value(0, "name"), Some(&Value::from("Alice")));

        db.delete("players", alice).unwrap();
        assert!(db.get_data("games_with_player1").unwrap().is_empty());

        assert!(matches!(db.get_data("missing"), Err(StoreError::ViewNotFound(_))));
    }

    #[test]
    fn test_import_uses_create_contract() {
        let mut db = create_test_db();
        let report = db
            .import("players|id|name\n50|Alice\n51|Bob\n\ngames|player1_id|player2_id\n1|2\n")
            .unwrap();
        assert_eq!(report.ids_for("players"), vec![1, 2]);
        assert_eq!(db.find("games", &fields! { "player1_id" => 1 }).unwrap().len(), 1);

        let err = db.import("players|name\nAlice\n").unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
        assert_eq!(db.table("players").unwrap().len(), 2);
    }
}
