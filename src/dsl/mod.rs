//! Schema DSL rendering.
//!
//! Turns a catalog schema into the compact text notation used by diagramming
//! tools:
//!
//! ```text
//! users [] { 
//!     id: INTEGER pk NOT NULL 
//!     name: VARCHAR(255) 
//! }
//!
//! orders.user_id > users.id
//! ```
//!
//! Table blocks come first, separated by blank lines, followed by one line per
//! source column of every many-to-one foreign key.

mod relation;
mod serializer;
mod types;

pub use relation::{format_relation, RenderedForeignKeys};
pub use serializer::{
    render_table, serialize, serialize_with, Document, RenderedTable, SerializeOptions,
};
pub use types::format_type;

use thiserror::Error;

/// Errors that abort a serialization call
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DslError {
    #[error("foreign key {foreign_key} has no column in its referenced index")]
    MissingJoinColumn { foreign_key: String },

    #[error("column {table}.{column} has a precision type but no precision")]
    MissingPrecision { table: String, column: String },
}
