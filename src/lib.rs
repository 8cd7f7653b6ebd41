//! relstore - an embedded, in-memory relational row store
//!
//! This is the root crate that ties the workspace together.
//! The implementation lives in the subcrates:
//! - `relstore-core`: tables, unique constraints, join views and bulk import
//! - `relstore-integrity`: foreign keys, cascading deletes and display labels
//! - `relstore-loader`: command-line loader for manifests and data files

pub use relstore_core::{fields, Database, Fields, Row, StoreConfig, StoreError, Value, ViewDefinition};
pub use relstore_integrity::{IntegrityError, Store, TableMetadata};

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
