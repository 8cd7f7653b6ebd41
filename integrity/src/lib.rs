//! # relstore integrity
//!
//! Referential integrity on top of the relstore core: per-table metadata
//! (primary keys, foreign keys, display labels), foreign-key validation on
//! writes, and cascading deletes that remove every dependent row before the
//! row they depend on.
//!
//! ```
//! use relstore_core::fields;
//! use relstore_integrity::{Store, TableMetadata};
//!
//! let mut store = Store::new();
//! store.define_table("players", &["id", "name"], &[]).unwrap();
//! store.define_table("games", &["id", "player1_id"], &[]).unwrap();
//! store
//!     .define_metadata("games", TableMetadata::new().foreign_key("player1_id", "players"))
//!     .unwrap();
//!
//! let alice = store.create("players", &fields! { "name" => "Alice" }).unwrap();
//! store.create("games", &fields! { "player1_id" => alice }).unwrap();
//!
//! let report = store.delete("players", alice).unwrap();
//! assert_eq!(report.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cascade;
pub mod display;
pub mod error;
pub mod hooks;
pub mod manifest;
pub mod metadata;
pub mod store;
pub mod validator;

pub use cascade::{CascadePlan, CascadeReport, CascadeResolver, Dependent};
pub use display::{resolve_display, DisplayRow};
pub use error::{IntegrityError, Result};
pub use hooks::{OrphanHook, UnreferencedRows};
pub use manifest::Manifest;
pub use metadata::{DisplaySpec, MetadataRegistry, TableMetadata};
pub use store::Store;
pub use validator::ForeignKeyValidator;
