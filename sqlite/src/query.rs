//! Schema-validated CRUD operations.
//!
//! Provides [`TableQuery`], which runs the generic operations against any
//! table named at runtime. Each operation introspects the table, validates
//! the caller's record or predicate against the live columns, and only then
//! builds and executes a statement. All values travel as bound parameters.
//!
//! # Example
//!
//! ```no_run
//! use exercise_tracker_core::{QueryOptions, Record};
//! use exercise_tracker_sqlite::TableQuery;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("storage.db").unwrap();
//! let query = TableQuery::new(&conn);
//!
//! let id = query.insert_record("Users", &Record::new().with("name", "Alice")).unwrap();
//! let user = query.get_one("Users", &Record::new().with("id", id)).unwrap();
//! assert!(user.is_some());
//!
//! let everyone = query.get_all("Users", &QueryOptions::new()).unwrap();
//! println!("{} users", everyone.len());
//! ```

use exercise_tracker_core::{
    DateRange, Fragment, QueryOptions, Record, TOTAL_ROWS_COLUMN, insert_statement,
    select_statement, validate_columns, validate_fields,
};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use crate::convert::{bind_params, column_names, row_to_record};
use crate::error::{OperationResult, StoreError};
use crate::schema::describe_table;

/// Rows from a date-ranged select plus the match count before `LIMIT`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangedRows {
    /// Matching rows, ordered and limited as requested.
    pub rows: Vec<Record>,
    /// Number of rows that matched before the limit was applied.
    pub total: u64,
}

/// CRUD interface over a borrowed connection or transaction.
///
/// Holds no state besides the connection, so it is cheap to create per
/// operation. Because [`rusqlite::Transaction`] dereferences to
/// [`Connection`], the same interface works inside a transaction.
pub struct TableQuery<'c> {
    conn: &'c Connection,
}

impl<'c> TableQuery<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Inserts `record` into `table` and returns the new row's id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the table, a column, or a value
    /// is invalid; [`StoreError::InsertFailed`] if the statement changed no
    /// rows; or a store fault (e.g. a unique violation) from the driver.
    pub fn insert_record(&self, table: &str, record: &Record) -> OperationResult<i64> {
        let schema = describe_table(self.conn, table)?;
        validate_fields(&schema, record)?;

        let stmt = insert_statement(&schema.name, record);
        debug!(table, sql = %stmt.sql, params = stmt.params.len(), "executing insert");

        let changes = self.conn.execute(&stmt.sql, bind_params(&stmt.params))?;
        if changes == 0 {
            return Err(StoreError::InsertFailed(schema.name));
        }

        Ok(self.conn.last_insert_rowid())
    }

    /// Returns the first row of `table` matching `predicate`.
    ///
    /// No matching row is a success with `None`, not an error.
    pub fn get_one(&self, table: &str, predicate: &Record) -> OperationResult<Option<Record>> {
        let schema = describe_table(self.conn, table)?;
        validate_fields(&schema, predicate)?;

        let options = QueryOptions::new().with_limit(1);
        let stmt = select_statement(&schema.name, predicate, None, &options, false);
        debug!(table, sql = %stmt.sql, params = stmt.params.len(), "executing select one");

        let mut prepared = self.conn.prepare(&stmt.sql)?;
        let columns = column_names(&prepared);
        let row = prepared
            .query_row(bind_params(&stmt.params), |row| row_to_record(row, &columns))
            .optional()?;
        Ok(row)
    }

    /// Returns every row of `table`, honoring ordering and limit.
    ///
    /// The sort column, if any, is checked against the schema first.
    pub fn get_all(&self, table: &str, options: &QueryOptions) -> OperationResult<Vec<Record>> {
        self.get_all_matching(table, &Record::new(), options)
    }

    /// Returns every row of `table` matching `predicate`, honoring ordering
    /// and limit.
    pub fn get_all_matching(
        &self,
        table: &str,
        predicate: &Record,
        options: &QueryOptions,
    ) -> OperationResult<Vec<Record>> {
        let schema = describe_table(self.conn, table)?;
        validate_fields(&schema, predicate)?;
        validate_columns(&schema, options.sort_column())?;

        let stmt = select_statement(&schema.name, predicate, None, options, false);
        debug!(table, sql = %stmt.sql, params = stmt.params.len(), "executing select");
        self.select_rows(&stmt)
    }

    /// Returns rows of `table` matching `predicate` whose date column falls
    /// inside `range`, honoring ordering and limit.
    ///
    /// The result also carries the number of matching rows before the limit
    /// was applied, for callers that paginate.
    pub fn get_all_matching_with_date_range(
        &self,
        table: &str,
        predicate: &Record,
        range: &DateRange,
        options: &QueryOptions,
    ) -> OperationResult<RangedRows> {
        let schema = describe_table(self.conn, table)?;
        validate_fields(&schema, predicate)?;
        let range_column = (!range.is_unbounded()).then_some(range.column.as_str());
        validate_columns(&schema, options.sort_column().into_iter().chain(range_column))?;

        let stmt = select_statement(&schema.name, predicate, Some(range), options, true);
        debug!(table, sql = %stmt.sql, params = stmt.params.len(), "executing ranged select");

        let mut rows = self.select_rows(&stmt)?;
        let mut total = 0;
        for row in &mut rows {
            if let Some(count) = row.remove(TOTAL_ROWS_COLUMN).and_then(|v| v.as_i64()) {
                total = u64::try_from(count).unwrap_or_default();
            }
        }

        Ok(RangedRows { rows, total })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    fn select_rows(&self, stmt: &Fragment) -> OperationResult<Vec<Record>> {
        let mut prepared = self.conn.prepare(&stmt.sql)?;
        let columns = column_names(&prepared);
        let rows = prepared
            .query_map(bind_params(&stmt.params), |row| row_to_record(row, &columns))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
