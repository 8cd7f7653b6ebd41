//! # relstore core
//!
//! Embedded, in-memory row store: fixed-schema tables with a store-assigned
//! identity column, composite unique constraints, equality-join views and a
//! line-format bulk importer.
//!
//! Everything is synchronous and single-threaded. The [`Database`] owns all
//! state; wrap it in a single mutex to share it across threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod import;
pub mod models;
pub mod utils;
pub mod view;

/// Re-export common types for ease of use
pub use catalog::TableCatalog;
pub use config::StoreConfig;
pub use database::{Database, TableDefinition};
pub use error::{Result, StoreError};
pub use import::{ImportReport, RowSink};
pub use models::{Fields, Row, Schema, Table, Value, ID_COLUMN};
pub use view::{JoinSpec, ResultSet, ViewDefinition};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a [`Fields`] map: `fields! { "name" => "Alice", "rating" => 1200 }`
#[macro_export]
macro_rules! fields {
    ($($column:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut fields = $crate::models::Fields::new();
        $(
            fields.insert($column.to_string(), $crate::models::Value::from($value));
        )*
        fields
    }};
}
