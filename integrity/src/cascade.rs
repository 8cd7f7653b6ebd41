//! Cascading deletes
//!
//! Deleting a row removes every row that depends on it through declared
//! foreign keys, directly or transitively. Dependents are discovered with an
//! iterative breadth-first walk over the reverse foreign-key graph. The
//! visited set is keyed by (table, id), so cyclic and self-referencing
//! graphs terminate. A row is deleted only after every row of the batch
//! that references it; the root goes last.
//!
//! Execution is not atomic. If a deletion fails part way, rows already
//! removed stay removed and the error reports how many there were.

use std::collections::{HashMap, VecDeque};
use serde::Serialize;
use log::{debug, info};

use relstore_core::{fields, Database, Row};

use crate::error::{IntegrityError, Result};
use crate::metadata::MetadataRegistry;

/// A row scheduled for deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependent {
    /// Normalized table name
    pub table: String,
    /// Row identity
    pub id: i64,
    /// Fewest reference edges between this row and the root
    pub depth: usize,
}

/// Ordered deletion schedule for one root row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadePlan {
    /// The row whose deletion was requested
    pub root: Dependent,
    /// Dependents, each before the rows it references
    pub dependents: Vec<Dependent>,
}

impl CascadePlan {
    /// Rows in deletion order: dependents, then the root
    pub fn order(&self) -> impl Iterator<Item = &Dependent> {
        self.dependents.iter().chain(std::iter::once(&self.root))
    }

    /// Total number of rows the plan deletes
    pub fn len(&self) -> usize {
        self.dependents.len() + 1
    }

    /// Always false; a plan deletes at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the plan deletes a given row
    pub fn contains(&self, table: &str, id: i64) -> bool {
        self.order().any(|d| d.table == table && d.id == id)
    }
}

/// What a cascade delete removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// (table, id) of every removed row, in deletion order
    pub deleted: Vec<(String, i64)>,
    /// Rows removed by orphan-cleanup hooks afterwards
    pub orphans_removed: usize,
}

impl CascadeReport {
    /// Number of rows removed by the cascade itself
    pub fn len(&self) -> usize {
        self.deleted.len()
    }

    /// Whether nothing was removed
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }

    /// Whether a given row was removed by the cascade
    pub fn removed(&self, table: &str, id: i64) -> bool {
        self.deleted.iter().any(|(t, i)| t == table && *i == id)
    }
}

/// Resolves and runs cascading deletes
#[derive(Debug, Clone, Copy)]
pub struct CascadeResolver<'a> {
    db: &'a Database,
    registry: &'a MetadataRegistry,
}

impl<'a> CascadeResolver<'a> {
    /// Create a resolver over a database and its metadata
    pub fn new(db: &'a Database, registry: &'a MetadataRegistry) -> Self {
        CascadeResolver { db, registry }
    }

    /// Plan the deletion of `table` row `id`; `None` if the row is not live.
    ///
    /// `table` may use any accepted spelling. Unknown tables are an error.
    /// Every row in the plan comes after all rows of the plan that reference
    /// it, except where references form a cycle.
    pub fn plan(&self, table: &str, id: i64) -> Result<Option<CascadePlan>> {
        let table = self.db.normalize(table);
        let row = match self.db.get(&table, id)? {
            Some(row) => row,
            None => return Ok(None),
        };

        // Discovery: every reached row once, every reference edge kept
        let mut nodes = vec![Dependent {
            table: table.clone(),
            id,
            depth: 0,
        }];
        let mut index: HashMap<(String, i64), usize> = HashMap::from([((table, id), 0)]);
        let mut referenced_by: Vec<Vec<usize>> = vec![Vec::new()];
        let mut queue: VecDeque<(usize, Row)> = VecDeque::from([(0, row)]);

        while let Some((current, row)) = queue.pop_front() {
            let (table, depth) = (nodes[current].table.clone(), nodes[current].depth);
            let key = self.primary_key_value(&table, &row)?;
            if key.is_null() {
                continue;
            }

            for reference in self.registry.referencing(&table) {
                let children = self
                    .db
                    .find(&reference.table, &fields! { reference.column.as_str() => key.clone() })?;
                for child in children {
                    let pair = (reference.table.clone(), child.id());
                    let child_index = match index.get(&pair).copied() {
                        Some(existing) => existing,
                        None => {
                            let next = nodes.len();
                            nodes.push(Dependent {
                                table: reference.table.clone(),
                                id: child.id(),
                                depth: depth + 1,
                            });
                            referenced_by.push(Vec::new());
                            index.insert(pair, next);
                            queue.push_back((next, child));
                            next
                        }
                    };
                    if !referenced_by[current].contains(&child_index) {
                        referenced_by[current].push(child_index);
                    }
                }
            }
        }

        let root = nodes[0].clone();
        let dependents: Vec<Dependent> = Self::post_order(&referenced_by)
            .into_iter()
            .filter(|position| *position != 0)
            .map(|position| nodes[position].clone())
            .collect();

        debug!("Planned cascade from {} {}: {} dependents", root.table, root.id, dependents.len());
        Ok(Some(CascadePlan { root, dependents }))
    }

    /// Iterative depth-first post-order from node 0: each node is emitted
    /// after every node referencing it, unless that node is on the current
    /// path (a cycle).
    fn post_order(referenced_by: &[Vec<usize>]) -> Vec<usize> {
        let mut order = Vec::with_capacity(referenced_by.len());
        let mut entered = vec![false; referenced_by.len()];
        let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
        entered[0] = true;

        while let Some((node, next)) = stack.pop() {
            match referenced_by[node].get(next) {
                Some(&child) => {
                    stack.push((node, next + 1));
                    if !entered[child] {
                        entered[child] = true;
                        stack.push((child, 0));
                    }
                }
                None => order.push(node),
            }
        }
        order
    }

    fn primary_key_value(&self, table: &str, row: &Row) -> Result<relstore_core::Value> {
        let primary_key = self.registry.primary_key(table);
        let position = self
            .db
            .table(table)?
            .schema()
            .position(primary_key)
            .ok_or_else(|| IntegrityError::NotFound(format!("primary key {} of {}", primary_key, table)))?;
        Ok(row.get(position).cloned().unwrap_or_default())
    }

    /// Delete every row of `plan` in order
    pub fn execute(db: &mut Database, plan: &CascadePlan) -> Result<CascadeReport> {
        let mut report = CascadeReport::default();

        for step in plan.order() {
            match db.delete(&step.table, step.id) {
                Ok(true) => report.deleted.push((step.table.clone(), step.id)),
                Ok(false) => debug!("Row {} of {} already gone", step.id, step.table),
                Err(err) => {
                    return Err(IntegrityError::CascadeInterrupted {
                        deleted: report.len(),
                        source: Box::new(err.into()),
                    })
                }
            }
        }

        info!(
            "Cascade from {} {} removed {} rows",
            plan.root.table,
            plan.root.id,
            report.len()
        );
        Ok(report)
    }
}
