//! Data models for the row store
//!
//! This module provides the value, row, schema and table types that make up
//! the storage layer.

mod value;
mod row;
mod schema;
mod table;

pub use value::{Value, ValueType};
pub use row::{Fields, Row};
pub use schema::{Schema, ID_COLUMN};
pub use table::{Table, UniqueIndex};
