//! Storage Layer - SQLite connection abstraction
//!
//! The single point of contact with the native store:
//! - statements carry their SQL text plus bound parameter values
//! - every row-returning query opens its own [`Cursor`]
//! - cursors are closed explicitly or on drop, never leaked
//! - databases live as `<data_dir>/<name>.db` files

pub mod connection;
pub mod statement;

pub use connection::{ColumnKind, Connection, Cursor, ResultSet};
pub use statement::{Statement, escape_literal, quote_ident, quote_literal};
