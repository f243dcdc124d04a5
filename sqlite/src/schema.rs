//! Schema DDL and live schema introspection.
//!
//! [`INIT_SQL`] creates the two tables of the exercise tracker domain:
//!
//! - `Users`: one row per user, with a unique `name`
//! - `Exercises`: logged exercises, each linked to a user by `userId`
//!
//! [`describe_table`] reads a table's columns back from the database at call
//! time. Nothing here is cached: the database file may be re-initialized
//! between runs, so every operation introspects afresh.

use exercise_tracker_core::{ColumnInfo, TableSchema, ValidationError};
use rusqlite::{Connection, params};

use crate::error::Result;

/// Name of the users table.
pub const USERS_TABLE: &str = "Users";

/// Name of the exercises table.
pub const EXERCISES_TABLE: &str = "Exercises";

/// Initialization script applied once at startup.
///
/// Uses `IF NOT EXISTS` throughout so it is safe to apply repeatedly.
pub const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS Users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(255) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS Exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    userId INTEGER NOT NULL,
    description TEXT NOT NULL,
    duration INTEGER NOT NULL,
    date TEXT NOT NULL DEFAULT (date('now')),
    FOREIGN KEY (userId) REFERENCES Users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_exercises_user_date ON Exercises(userId, date);
"#;

/// Drops both tables in reverse dependency order.
pub const DROP_SQL: &str = r#"
DROP INDEX IF EXISTS idx_exercises_user_date;
DROP TABLE IF EXISTS Exercises;
DROP TABLE IF EXISTS Users;
"#;

/// Describes `table` as it exists in the database right now.
///
/// The table name is bound as a parameter to `pragma_table_info`, so it is
/// never interpolated into SQL text.
///
/// # Errors
///
/// Returns [`ValidationError::NoSuchTable`] (wrapped in
/// [`StoreError::Validation`](crate::StoreError::Validation)) when the
/// database reports no columns for the name, or a store fault if the
/// introspection query itself fails.
pub fn describe_table(conn: &Connection, table: &str) -> Result<TableSchema> {
    let mut stmt = conn.prepare(
        r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#,
    )?;

    let columns = stmt
        .query_map(params![table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get(2)?,
                primary_key: row.get::<_, i64>(3)? > 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(ValidationError::NoSuchTable(table.to_string()).into());
    }

    Ok(TableSchema::new(table, columns))
}
