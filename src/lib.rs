//! # Rowkeeper - schema-driven entity mapping over SQLite
//!
//! Maps in-memory domain records onto rows of a relational store.
//!
//! Rowkeeper provides:
//! - A connection abstraction with per-query cursor handles and parameter binding
//! - Immutable entity schemas rendered into DDL/DML statements
//! - A generic entity manager (validate, create, read, update, delete)
//! - Foreign-key dependency ordering for table bootstrap
//! - The retail-store entities (customers, suppliers, supplier names)

pub mod value;
pub mod storage;
pub mod schema;
pub mod manager;
pub mod entities;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use value::{Row, Value};
pub use storage::{ColumnKind, Connection, Cursor, ResultSet, Statement};
pub use schema::{EntitySchema, FieldDef, FieldKind, ForeignKey};
pub use schema::registry::{DependencyGraph, bootstrap};
pub use manager::{Entity, EntityManager};
pub use entities::{Customer, Supplier, SupplierName};

/// Result type alias for Rowkeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Rowkeeper operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to initialize table '{table}': {reason}")]
    Schema { table: String, reason: String },

    #[error("Table dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("Invalid {table}.{field}: {reason}")]
    Validation {
        table: String,
        field: String,
        reason: String,
    },

    #[error("Failed to {operation} on '{table}': {reason}")]
    Execution {
        operation: String,
        table: String,
        reason: String,
    },

    #[error("Row with id '{id}' wasn't found in '{table}'")]
    NotFound { table: String, id: i64 },

    #[error("Failed to fetch rows from '{table}': {reason}")]
    Fetch { table: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    /// Errors that leave the session unusable; bootstrap aborts on these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Schema { .. } | Error::DependencyCycle(_)
        )
    }

    pub(crate) fn execution(operation: impl Into<String>, table: &str, reason: impl ToString) -> Self {
        Error::Execution {
            operation: operation.into(),
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }
}
