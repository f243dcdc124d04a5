//! SQLite data-access layer for the exercise tracker.
//!
//! This crate runs the generic, schema-validated CRUD operations from
//! [`exercise_tracker_core`] against a SQLite file, and layers the typed
//! users/exercises functions on top of them.
//!
//! # Architecture
//!
//! - **`schema`**: built-in DDL and live table introspection
//! - **`query`**: validated CRUD over a borrowed connection ([`TableQuery`])
//! - **`connection`**: per-operation connection scoping ([`Store`])
//! - **`config`**: YAML-loadable store settings ([`StoreConfig`])
//! - **`models`**: users and exercises on top of the generic operations
//!
//! # Quick start
//!
//! ```no_run
//! use exercise_tracker_sqlite::{
//!     LogFilter, NewExercise, Store, add_exercise, add_user, exercise_log,
//! };
//!
//! let store = Store::new("storage.db");
//! store.init().unwrap();
//!
//! let alice = add_user(&store, "Alice").unwrap();
//! add_exercise(
//!     &store,
//!     &NewExercise {
//!         user_id: alice.id,
//!         description: "run".into(),
//!         duration: 30,
//!         date: None,
//!     },
//! )
//! .unwrap();
//!
//! let log = exercise_log(&store, alice.id, &LogFilter::default()).unwrap();
//! println!("{} logged {} exercises", log.user.name, log.count);
//! ```
//!
//! # Generic access
//!
//! Table and column names are plain strings checked against the live
//! schema on every call, so the same operations serve any table:
//!
//! ```no_run
//! use exercise_tracker_core::{QueryOptions, Record, SortDirection};
//! use exercise_tracker_sqlite::Store;
//!
//! let store = Store::new("storage.db");
//! let options = QueryOptions::new().order_by("date", Some(SortDirection::Desc)).with_limit(1);
//! let latest = store
//!     .get_all_matching("Exercises", &Record::new().with("userId", 1), &options)
//!     .unwrap();
//! ```

mod config;
mod connection;
mod convert;
mod error;
mod models;
mod query;
mod schema;

pub use config::StoreConfig;
pub use connection::Store;
pub use error::{FaultKind, OperationResult, Result, StoreError};
pub use models::{
    DATE_FORMAT, Exercise, ExerciseLog, LogFilter, LoggedExercise, NewExercise, User, add_exercise,
    add_user, all_exercises, exercise_log, get_user,
};
pub use query::{RangedRows, TableQuery};
pub use schema::{DROP_SQL, EXERCISES_TABLE, INIT_SQL, USERS_TABLE, describe_table};
