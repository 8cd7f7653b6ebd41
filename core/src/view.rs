//! Join views
//!
//! A view is an ordered list of tables and the column equalities that chain
//! them together. It holds no rows: every read recomputes the inner join from
//! the live tables with a nested loop, left-major and right-minor.

use serde::{Serialize, Deserialize};
use log::trace;

use crate::catalog::TableCatalog;
use crate::error::{column_not_found, Result, StoreError};
use crate::models::Value;
use crate::utils::StringUtils;

/// Equality between a column of the accumulated result and a column of the
/// next table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Column of the rows joined so far, bare or `table.column`
    pub left: String,

    /// Column of the table being joined
    pub right: String,
}

/// Definition of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Tables in join order
    pub tables: Vec<String>,

    /// One join per table after the first
    pub joins: Vec<JoinSpec>,
}

impl ViewDefinition {
    /// Start a view from a single table
    pub fn from_table(table: &str) -> Self {
        ViewDefinition {
            tables: vec![table.to_string()],
            joins: Vec::new(),
        }
    }

    /// Join another table where `left` of the rows so far equals `right` of
    /// the new table
    pub fn join(mut self, table: &str, left: &str, right: &str) -> Self {
        self.tables.push(table.to_string());
        self.joins.push(JoinSpec {
            left: left.to_string(),
            right: right.to_string(),
        });
        self
    }

    /// Check the shape of the definition and that every table exists
    pub fn validate(&self, catalog: &TableCatalog) -> Result<()> {
        if self.tables.is_empty() {
            return Err(StoreError::InvalidView("a view needs at least one table".to_string()));
        }
        if self.joins.len() + 1 != self.tables.len() {
            return Err(StoreError::InvalidView(format!(
                "{} tables need {} joins, found {}",
                self.tables.len(),
                self.tables.len() - 1,
                self.joins.len()
            )));
        }
        for table in &self.tables {
            catalog.get(table)?;
        }
        Ok(())
    }
}

/// Rows produced by a view
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultSet {
    /// Column names; columns added by joins are `table.column`
    pub columns: Vec<String>,

    /// Joined rows aligned to `columns`
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Position of a column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of a column in a given row
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(position))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Nested-loop equality join executor
#[derive(Debug)]
pub struct JoinEngine;

impl JoinEngine {
    /// Compute the current contents of a view
    pub fn execute(catalog: &TableCatalog, view: &ViewDefinition) -> Result<ResultSet> {
        view.validate(catalog)?;

        let first = catalog.get(&view.tables[0])?;
        let first_bare = catalog.bare_name(first.name());
        let first_width = first.schema().len();

        let mut result = ResultSet {
            columns: first.schema().columns().to_vec(),
            rows: first.rows().map(|r| r.values().to_vec()).collect(),
        };
        // Left columns come from every table joined so far
        let mut joined_tables = vec![first.name()];

        for (table_name, spec) in view.tables[1..].iter().zip(&view.joins) {
            let right = catalog.get(table_name)?;
            let right_bare = catalog.bare_name(right.name());

            let left_position = Self::resolve_left(&result.columns, &first_bare, first_width, &spec.left)
                .ok_or_else(|| column_not_found(&joined_tables.join(", "), &spec.left))?;
            let right_column = StringUtils::strip_prefix(&spec.right, &format!("{}.", right_bare));
            let right_position = right
                .schema()
                .position(right_column)
                .ok_or_else(|| column_not_found(right.name(), &spec.right))?;

            let mut joined = Vec::new();
            for left_row in &result.rows {
                let key = &left_row[left_position];
                for right_row in right.rows() {
                    if right_row.get(right_position) != Some(key) {
                        continue;
                    }
                    let mut combined = left_row.clone();
                    combined.extend(right_row.values()[1..].iter().cloned());
                    joined.push(combined);
                }
            }

            result.columns.extend(
                right.schema().columns()[1..]
                    .iter()
                    .map(|c| StringUtils::qualify(&right_bare, c)),
            );
            result.rows = joined;
            joined_tables.push(right.name());
            trace!("Joined {} on {} = {}: {} rows", right.name(), spec.left, spec.right, result.rows.len());
        }

        Ok(result)
    }

    /// Find a left column by exact name, or as `first_table.column` for the
    /// columns of the first table
    fn resolve_left(columns: &[String], first_bare: &str, first_width: usize, name: &str) -> Option<usize> {
        if let Some(position) = columns.iter().position(|c| c == name) {
            return Some(position);
        }
        let bare = name.strip_prefix(first_bare)?.strip_prefix('.')?;
        columns[..first_width].iter().position(|c| c == bare)
    }
}
