//! Per-operation connection scoping.
//!
//! [`Store`] holds only configuration. Every operation opens its own
//! connection, runs, and closes it again on every exit path, so concurrent
//! callers share nothing but the database file. Faults raised while the
//! handle is open come back as [`StoreError`] values.
//!
//! # Example
//!
//! ```no_run
//! use exercise_tracker_core::Record;
//! use exercise_tracker_sqlite::Store;
//!
//! let store = Store::new("storage.db");
//! store.init().unwrap();
//!
//! let id = store.insert_record("Users", &Record::new().with("name", "Alice")).unwrap();
//!
//! // Insert and read back atomically.
//! let row = store
//!     .with_transaction(|conn| {
//!         let query = exercise_tracker_sqlite::TableQuery::new(conn);
//!         let id = query.insert_record("Users", &Record::new().with("name", "Bob"))?;
//!         query.get_one("Users", &Record::new().with("id", id))
//!     })
//!     .unwrap();
//! assert!(row.is_some());
//! # let _ = id;
//! ```

use std::path::Path;
use std::time::Duration;

use exercise_tracker_core::{DateRange, QueryOptions, Record};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, error, info};

use crate::config::StoreConfig;
use crate::error::{OperationResult, StoreError};
use crate::query::{RangedRows, TableQuery};
use crate::schema::DROP_SQL;

/// Handle to a SQLite database file.
///
/// Cloning a `Store` is cheap and shares nothing at runtime; each clone
/// opens its own connections.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    /// Creates a store for `database` with default settings.
    ///
    /// The file is not touched until the first operation.
    pub fn new(database: impl AsRef<Path>) -> Self {
        Self::open(StoreConfig::new(database.as_ref()))
    }

    /// Creates a store from a full configuration.
    pub fn open(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens a connection, runs `op` with it, and releases it.
    ///
    /// The connection is closed whether `op` succeeds or fails; if `op`
    /// succeeded but closing fails, the close error is returned instead.
    ///
    /// # Errors
    ///
    /// Returns a store fault if the connection cannot be opened or
    /// configured, or whatever error `op` returns.
    pub fn with_connection<T, F>(&self, op: F) -> OperationResult<T>
    where
        F: FnOnce(&Connection) -> OperationResult<T>,
    {
        let conn = self.connect().inspect_err(log_failure)?;

        let result = op(&conn);
        let closed = conn.close().map_err(|(_conn, err)| StoreError::from(err));

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) | (Err(err), _) => {
                log_failure(&err);
                Err(err)
            }
        }
    }

    /// Like [`with_connection`](Self::with_connection), but runs `op` inside
    /// a transaction that commits on success and rolls back on error.
    ///
    /// Use this when several operations must observe each other atomically,
    /// such as inserting a row and reading it back.
    ///
    /// Begins with `BEGIN IMMEDIATE`; concurrent transactions wait on the
    /// busy timeout for the write lock.
    pub fn with_transaction<T, F>(&self, op: F) -> OperationResult<T>
    where
        F: FnOnce(&Connection) -> OperationResult<T>,
    {
        self.with_connection(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Applies the configured initialization script (the built-in schema by
    /// default).
    pub fn init(&self) -> OperationResult<()> {
        let sql = self.config.resolve_init_sql()?;
        self.init_with(&sql)
    }

    /// Applies `script` as a batch of statements.
    pub fn init_with(&self, script: &str) -> OperationResult<()> {
        self.with_connection(|conn| {
            conn.execute_batch(script)?;
            Ok(())
        })?;
        info!(database = %self.config.database.display(), "database initialized");
        Ok(())
    }

    /// Drops the built-in tables and reapplies the initialization script.
    ///
    /// Only the `Users` and `Exercises` tables are dropped. Tables created by
    /// a custom `init_script` keep their rows.
    pub fn reset(&self) -> OperationResult<()> {
        self.with_transaction(|conn| {
            conn.execute_batch(DROP_SQL)?;
            Ok(())
        })?;
        self.init()
    }

    /// See [`TableQuery::insert_record`].
    pub fn insert_record(&self, table: &str, record: &Record) -> OperationResult<i64> {
        self.with_connection(|conn| TableQuery::new(conn).insert_record(table, record))
    }

    /// See [`TableQuery::get_one`].
    pub fn get_one(&self, table: &str, predicate: &Record) -> OperationResult<Option<Record>> {
        self.with_connection(|conn| TableQuery::new(conn).get_one(table, predicate))
    }

    /// See [`TableQuery::get_all`].
    pub fn get_all(&self, table: &str, options: &QueryOptions) -> OperationResult<Vec<Record>> {
        self.with_connection(|conn| TableQuery::new(conn).get_all(table, options))
    }

    /// See [`TableQuery::get_all_matching`].
    pub fn get_all_matching(
        &self,
        table: &str,
        predicate: &Record,
        options: &QueryOptions,
    ) -> OperationResult<Vec<Record>> {
        self.with_connection(|conn| {
            TableQuery::new(conn).get_all_matching(table, predicate, options)
        })
    }

    /// See [`TableQuery::get_all_matching_with_date_range`].
    pub fn get_all_matching_with_date_range(
        &self,
        table: &str,
        predicate: &Record,
        range: &DateRange,
        options: &QueryOptions,
    ) -> OperationResult<RangedRows> {
        self.with_connection(|conn| {
            TableQuery::new(conn).get_all_matching_with_date_range(table, predicate, range, options)
        })
    }

    fn connect(&self) -> OperationResult<Connection> {
        debug!(database = %self.config.database.display(), "opening connection");
        let conn = Connection::open(&self.config.database)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
        conn.execute_batch(if self.config.foreign_keys {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        })?;
        Ok(conn)
    }
}

/// Driver faults are logged at error level; expected failures at debug.
fn log_failure(err: &StoreError) {
    match err {
        StoreError::StoreFault { kind, source } => {
            error!(?kind, error = %source, "error when executing store command");
        }
        other => debug!(error = %other, "store operation rejected"),
    }
}
