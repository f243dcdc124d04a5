//! Store-independent core of the exercise tracker's data-access layer.
//!
//! This crate defines the pieces of the generic, schema-validated
//! data-access layer that never touch the database:
//!
//! - [`Value`] and [`Record`]: untyped scalar values and ordered
//!   column→value mappings used for rows and equality predicates.
//! - [`TableSchema`]: the live column list of a table, discovered by
//!   introspection rather than declared as Rust types.
//! - [`validate_fields`] / [`is_compatible`]: checks a record against a
//!   table schema, short-circuiting on the first invalid column.
//! - [`select_statement`] / [`insert_statement`] and the individual clause
//!   renderers: build SQL with bound parameters only.
//!
//! # Example
//!
//! ```
//! use exercise_tracker_core::*;
//!
//! let users = TableSchema::new(
//!     "Users",
//!     vec![
//!         ColumnInfo::new("id", "INTEGER"),
//!         ColumnInfo::new("name", "VARCHAR(255)"),
//!     ],
//! );
//!
//! let record = Record::new().with("name", "Alice");
//! validate_fields(&users, &record).unwrap();
//!
//! let insert = insert_statement(&users.name, &record);
//! assert_eq!(insert.sql, r#"INSERT INTO "Users" ("name") VALUES (?)"#);
//! assert_eq!(insert.params, vec![Value::from("Alice")]);
//! ```

mod clause;
mod types;
mod validate;

pub use clause::{
    Fragment, TOTAL_ROWS_COLUMN, date_range_clause, insert_statement, options_clause,
    predicate_clause, quote_ident, select_statement,
};
pub use types::*;
pub use validate::{
    ValidationError, accepted_prefixes, is_compatible, validate_columns, validate_fields,
};
