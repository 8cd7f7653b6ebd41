//! Bulk import
//!
//! Line format:
//!
//! ```text
//! # comment
//! players|id|name|rating
//! |Alice|1200
//! |Bob|
//!
//! games|player1_id|player2_id
//! 1|2
//! ```
//!
//! A block is a header line (`table|column|...`) followed by pipe-delimited
//! value lines and ends at a blank line. Every record goes through the
//! writer's create contract, so identities are assigned by the store and an
//! `id` column in the header is ignored. Import is not atomic: records
//! written before a failure stay written.

use log::{debug, info};

use crate::error::{malformed, Result, StoreError};
use crate::models::{Fields, Value, ID_COLUMN};

/// Field separator of the line format
pub const SEPARATOR: char = '|';

/// Anything that accepts new rows through the create contract
pub trait RowSink {
    /// Error produced by the writer
    type Error: From<StoreError>;

    /// Create a row and return its identity
    fn insert_record(&mut self, table: &str, fields: &Fields) -> std::result::Result<i64, Self::Error>;
}

/// One parsed block of import data
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBlock {
    /// Table named by the header
    pub table: String,

    /// Columns named by the header
    pub columns: Vec<String>,

    /// Value lines with their one-based line numbers
    pub records: Vec<(usize, Vec<Value>)>,
}

impl ImportBlock {
    /// Records as field maps, without the identity column
    pub fn fields(&self) -> impl Iterator<Item = (usize, Fields)> + '_ {
        self.records.iter().map(move |(line, values)| {
            let fields = self
                .columns
                .iter()
                .zip(values)
                .filter(|(column, _)| column.as_str() != ID_COLUMN)
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect();
            (*line, fields)
        })
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// (table, identity) of every created row, in input order
    pub created: Vec<(String, i64)>,
}

impl ImportReport {
    /// Number of rows created
    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// Whether nothing was created
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Identities created in one table
    pub fn ids_for(&self, table: &str) -> Vec<i64> {
        self.created
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, id)| *id)
            .collect()
    }
}

/// Parse import text into blocks
pub fn parse(text: &str) -> Result<Vec<ImportBlock>> {
    let mut blocks = Vec::new();
    let mut current: Option<ImportBlock> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');

        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        if line.trim_start().starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
        match current.as_mut() {
            None => current = Some(parse_header(line_no, &parts)?),
            Some(block) => {
                if parts.len() != block.columns.len() {
                    return Err(malformed(
                        line_no,
                        format!(
                            "expected {} values for {}, found {}",
                            block.columns.len(),
                            block.table,
                            parts.len()
                        ),
                    ));
                }
                let values = parts.into_iter().map(Value::parse_literal).collect();
                block.records.push((line_no, values));
            }
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }
    debug!("Parsed {} import blocks", blocks.len());
    Ok(blocks)
}

fn parse_header(line_no: usize, parts: &[&str]) -> Result<ImportBlock> {
    let (table, columns) = match parts.split_first() {
        Some((table, columns)) if !table.is_empty() && !columns.is_empty() => (table, columns),
        _ => return Err(malformed(line_no, "header needs a table name and at least one column")),
    };
    if let Some(position) = columns.iter().position(|c| c.is_empty()) {
        return Err(malformed(line_no, format!("column {} of the header is empty", position + 1)));
    }

    Ok(ImportBlock {
        table: table.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        records: Vec::new(),
    })
}

/// Parse `text` and create every record through `sink`
pub fn import_into<S: RowSink>(sink: &mut S, text: &str) -> std::result::Result<ImportReport, S::Error> {
    let blocks = parse(text)?;
    let mut report = ImportReport::default();

    for block in &blocks {
        for (line, fields) in block.fields() {
            debug!("Importing line {} into {}", line, block.table);
            let id = sink.insert_record(&block.table, &fields)?;
            report.created.push((block.table.clone(), id));
        }
    }

    info!("Imported {} rows from {} blocks", report.len(), blocks.len());
    Ok(report)
}
