//! Database table representation
//!
//! A table owns its schema, its unique indexes and the live rows. Rows live
//! in an arena of slots addressed through an identity -> slot map, so point
//! lookups never scan.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use log::{debug, trace};

use crate::error::{column_not_found, Result, StoreError};
use super::row::{Fields, Row};
use super::schema::{Schema, ID_COLUMN};
use super::value::Value;

/// Unique constraint with its index
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    columns: Vec<String>,
    positions: Vec<usize>,
    /// Key tuple -> identity of the owning row
    keys: HashMap<Vec<Value>, i64>,
}

impl UniqueIndex {
    fn new(table: &str, schema: &Schema, columns: &[String]) -> Result<Self> {
        if columns.is_empty() {
            return Err(StoreError::InvalidSchema(format!(
                "empty unique constraint on table {}",
                table
            )));
        }

        let mut positions = Vec::with_capacity(columns.len());
        for column in columns {
            let position = schema
                .position(column)
                .ok_or_else(|| column_not_found(table, column))?;
            if positions.contains(&position) {
                return Err(StoreError::InvalidSchema(format!(
                    "column {} repeated in unique constraint on table {}",
                    column, table
                )));
            }
            positions.push(position);
        }

        Ok(UniqueIndex {
            columns: columns.to_vec(),
            positions,
            keys: HashMap::new(),
        })
    }

    /// Columns covered by the constraint
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index key of a row: the values of the constrained columns, nulls
    /// included
    fn key_of(&self, row: &Row) -> Vec<Value> {
        self.positions
            .iter()
            .map(|p| row.get(*p).cloned().unwrap_or_default())
            .collect()
    }

    /// Identity of the row owning a key, other than `except`
    fn collides(&self, key: &[Value], except: Option<i64>) -> bool {
        match self.keys.get(key) {
            Some(owner) => Some(*owner) != except,
            None => false,
        }
    }

    fn violation(&self, table: &str) -> StoreError {
        StoreError::UniqueViolation {
            table: table.to_string(),
            columns: self.columns.clone(),
        }
    }
}

/// A table: schema, unique indexes and rows
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    indexes: Vec<UniqueIndex>,
    slots: Vec<Option<Row>>,
    positions: HashMap<i64, usize>,
    tombstones: usize,
    next_id: i64,
    compaction_threshold: usize,
}

impl Debug for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.schema.columns())
            .field("unique", &self.indexes.iter().map(|i| &i.columns).collect::<Vec<_>>())
            .field("row_count", &self.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Table {
    /// Create an empty table.
    ///
    /// Fails if the first column is not the identity column, if column
    /// names repeat, or if a unique constraint names an unknown column.
    pub fn new<S: AsRef<str>>(
        name: &str,
        columns: &[S],
        unique_constraints: &[Vec<String>],
        compaction_threshold: usize,
    ) -> Result<Self> {
        let schema = Schema::new(columns)?;
        let indexes = unique_constraints
            .iter()
            .map(|columns| UniqueIndex::new(name, &schema, columns))
            .collect::<Result<Vec<_>>>()?;

        Ok(Table {
            name: name.to_string(),
            schema,
            indexes,
            slots: Vec::new(),
            positions: HashMap::new(),
            tombstones: 0,
            next_id: 1,
            compaction_threshold,
        })
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Unique constraints and their indexes
    pub fn unique_indexes(&self) -> &[UniqueIndex] {
        &self.indexes
    }

    /// Identity the next successful insert will receive
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Number of live rows
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the table has no live rows
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Live rows in insertion order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.slots.iter().flatten()
    }

    /// Get a row by identity
    pub fn get(&self, id: i64) -> Option<&Row> {
        self.positions
            .get(&id)
            .and_then(|slot| self.slots[*slot].as_ref())
    }

    /// Check if a row with this identity is live
    pub fn contains(&self, id: i64) -> bool {
        self.positions.contains_key(&id)
    }

    /// Rows whose named columns equal the filter values, in insertion order
    pub fn find(&self, filter: &Fields) -> Result<Vec<Row>> {
        let mut predicates = Vec::with_capacity(filter.len());
        for (column, value) in filter {
            let position = self
                .schema
                .position(column)
                .ok_or_else(|| column_not_found(&self.name, column))?;
            predicates.push((position, value));
        }

        // Identity filters resolve through the slot map
        if let Some(id) = filter.get(ID_COLUMN) {
            let candidate = id.as_integer().and_then(|id| self.get(id));
            return Ok(candidate
                .filter(|row| Self::matches(row, &predicates))
                .cloned()
                .into_iter()
                .collect());
        }

        Ok(self
            .rows()
            .filter(|row| Self::matches(row, &predicates))
            .cloned()
            .collect())
    }

    fn matches(row: &Row, predicates: &[(usize, &Value)]) -> bool {
        predicates
            .iter()
            .all(|(position, value)| row.get(*position) == Some(*value))
    }

    /// Apply supplied fields onto a row, skipping the identity column
    fn apply(&self, row: &mut Row, fields: &Fields) -> Result<()> {
        for (column, value) in fields {
            if column == ID_COLUMN {
                continue;
            }
            let position = self
                .schema
                .position(column)
                .ok_or_else(|| column_not_found(&self.name, column))?;
            row.set(position, value.clone());
        }
        Ok(())
    }

    /// Insert a row built from `fields`; returns the new identity.
    ///
    /// Unset columns are null. An `id` entry is ignored. Nothing changes
    /// unless every unique constraint accepts the prospective row.
    pub fn insert(&mut self, fields: &Fields) -> Result<i64> {
        let id = self.next_id;
        let mut values = vec![Value::Null; self.schema.len()];
        values[0] = Value::Integer(id);
        let mut row = Row::new(values);
        self.apply(&mut row, fields)?;

        let mut keys = Vec::with_capacity(self.indexes.len());
        for index in &self.indexes {
            let key = index.key_of(&row);
            if index.collides(&key, None) {
                debug!("Rejected insert into {}: unique {:?}", self.name, index.columns);
                return Err(index.violation(&self.name));
            }
            keys.push(key);
        }

        for (index, key) in self.indexes.iter_mut().zip(keys) {
            index.keys.insert(key, id);
        }
        self.slots.push(Some(row));
        self.positions.insert(id, self.slots.len() - 1);
        self.next_id += 1;

        trace!("Inserted row {} into {}", id, self.name);
        Ok(id)
    }

    /// Update supplied columns of a row.
    ///
    /// Returns `Ok(false)` when the identity is not live. On a unique
    /// collision with a different row the stored row is left untouched.
    pub fn update(&mut self, id: i64, fields: &Fields) -> Result<bool> {
        let slot = match self.positions.get(&id) {
            Some(slot) => *slot,
            None => return Ok(false),
        };
        let current = match &self.slots[slot] {
            Some(row) => row,
            None => return Ok(false),
        };

        let mut candidate = current.clone();
        self.apply(&mut candidate, fields)?;

        let mut changes = Vec::with_capacity(self.indexes.len());
        for index in &self.indexes {
            let old_key = index.key_of(current);
            let new_key = index.key_of(&candidate);
            if old_key == new_key {
                changes.push(None);
                continue;
            }
            if index.collides(&new_key, Some(id)) {
                debug!("Rejected update of {} row {}: unique {:?}", self.name, id, index.columns);
                return Err(index.violation(&self.name));
            }
            changes.push(Some((old_key, new_key)));
        }

        for (index, change) in self.indexes.iter_mut().zip(changes) {
            if let Some((old_key, new_key)) = change {
                index.keys.remove(&old_key);
                index.keys.insert(new_key, id);
            }
        }
        self.slots[slot] = Some(candidate);

        trace!("Updated row {} in {}", id, self.name);
        Ok(true)
    }

    /// Delete a row; returns the removed row, or `None` if it was not live
    pub fn delete(&mut self, id: i64) -> Option<Row> {
        let slot = self.positions.remove(&id)?;
        let row = self.slots[slot].take()?;

        for index in &mut self.indexes {
            let key = index.key_of(&row);
            if index.keys.get(&key) == Some(&id) {
                index.keys.remove(&key);
            }
        }
        self.tombstones += 1;
        self.maybe_compact();

        trace!("Deleted row {} from {}", id, self.name);
        Some(row)
    }

    /// Drop tombstoned slots once they outnumber live rows
    fn maybe_compact(&mut self) {
        if self.tombstones < self.compaction_threshold.max(1)
            || self.tombstones <= self.positions.len()
        {
            return;
        }

        self.slots.retain(Option::is_some);
        self.positions.clear();
        for (slot, row) in self.slots.iter().enumerate() {
            if let Some(row) = row {
                self.positions.insert(row.id(), slot);
            }
        }
        debug!(
            "Compacted {}: dropped {} tombstones, {} rows live",
            self.name,
            self.tombstones,
            self.positions.len()
        );
        self.tombstones = 0;
    }
}
