//! Runtime validation of records against a live table schema.
//!
//! Checks that a table exists, that every column a record names exists on
//! it, and that every non-empty value's runtime [`TypeClass`] is compatible
//! with the column's declared type. Validation stops at the first problem.
//!
//! # Examples
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
//! assert!(validate_fields(&users, &Record::new().with("name", "Alice")).is_ok());
//!
//! // Numbers are not accepted by text columns.
//! let err = validate_fields(&users, &Record::new().with("name", 5)).unwrap_err();
//! assert!(matches!(err, ValidationError::TypeMismatch { .. }));
//! ```

use thiserror::Error;

use crate::{Record, TableSchema, TypeClass};

/// Record/schema validation errors.
///
/// The `Display` impl provides a human-readable message suitable for
/// returning to callers unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The table does not exist (introspection reported no columns).
    #[error("no such table: {0}")]
    NoSuchTable(String),
    /// A record key does not name a column of the table.
    #[error("try to access wrong column: {column}, from table: {table}")]
    UnknownColumn { column: String, table: String },
    /// A value's runtime type is not legal for the column's declared type.
    #[error("attempt to insert data: {value} in column: {column}, from table: {table}")]
    TypeMismatch {
        value: String,
        column: String,
        table: String,
    },
}

/// Declared-type prefixes accepted for each runtime type class.
///
/// Matching on prefixes tolerates size suffixes such as `VARCHAR(255)`
/// without an exhaustive type table. [`TypeClass::Binary`] has no accepted
/// prefixes, so it is never compatible.
pub fn accepted_prefixes(class: TypeClass) -> &'static [&'static str] {
    match class {
        TypeClass::Numeric => &["INT"],
        TypeClass::Text => &["VARCHAR", "CHAR", "TEXT"],
        TypeClass::Binary => &[],
    }
}

/// Returns `true` if a value of `class` may be stored in a column declared
/// as `declared_type`.
///
/// The comparison is a case-sensitive prefix test.
///
/// # Examples
///
/// ```
/// use exercise_tracker_core::{TypeClass, is_compatible};
///
/// assert!(is_compatible(TypeClass::Numeric, "INTEGER"));
/// assert!(is_compatible(TypeClass::Text, "VARCHAR(255)"));
/// assert!(!is_compatible(TypeClass::Text, "INTEGER"));
/// assert!(!is_compatible(TypeClass::Numeric, "integer"));
/// ```
pub fn is_compatible(class: TypeClass, declared_type: &str) -> bool {
    accepted_prefixes(class)
        .iter()
        .any(|prefix| declared_type.starts_with(prefix))
}

/// Validates `record` against `table`.
///
/// 1. An empty schema means the table does not exist.
/// 2. An empty record is trivially valid.
/// 3. Each key, in order, must name a column; empty values (`NULL` or `""`)
///    skip the type check; other values must have a compatible type class.
///
/// Returns the first error encountered.
///
/// # Errors
///
/// Returns [`ValidationError::NoSuchTable`], [`ValidationError::UnknownColumn`],
/// or [`ValidationError::TypeMismatch`].
pub fn validate_fields(table: &TableSchema, record: &Record) -> Result<(), ValidationError> {
    if table.is_empty() {
        return Err(ValidationError::NoSuchTable(table.name.clone()));
    }

    for (column, value) in record.iter() {
        let info = table
            .column(column)
            .ok_or_else(|| ValidationError::UnknownColumn {
                column: column.to_string(),
                table: table.name.clone(),
            })?;

        if value.is_empty() {
            continue;
        }

        let compatible = value
            .type_class()
            .is_some_and(|class| is_compatible(class, &info.declared_type));
        if !compatible {
            return Err(ValidationError::TypeMismatch {
                value: value.to_string(),
                column: column.to_string(),
                table: table.name.clone(),
            });
        }
    }

    Ok(())
}

/// Validates that every name in `columns` exists on `table`.
///
/// Used for columns that carry no value, such as the sort column or the
/// date-range column.
///
/// # Errors
///
/// Returns [`ValidationError::NoSuchTable`] or [`ValidationError::UnknownColumn`].
pub fn validate_columns<'a>(
    table: &TableSchema,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    if table.is_empty() {
        return Err(ValidationError::NoSuchTable(table.name.clone()));
    }

    for column in columns {
        if !table.has_column(column) {
            return Err(ValidationError::UnknownColumn {
                column: column.to_string(),
                table: table.name.clone(),
            });
        }
    }

    Ok(())
}
