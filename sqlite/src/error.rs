//! Error types for store operations.
//!
//! Every CRUD operation returns an [`OperationResult`]: either its success
//! payload or exactly one [`StoreError`]. Expected failures (unknown table or
//! column, type mismatch, nothing inserted) are plain values; only genuine
//! driver faults are wrapped as [`StoreError::StoreFault`].

use exercise_tracker_core::ValidationError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Classification of a driver-level fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A `UNIQUE` or `PRIMARY KEY` constraint rejected a duplicate value.
    UniqueViolation,
    /// Any other constraint violation (`NOT NULL`, `FOREIGN KEY`, `CHECK`).
    Constraint,
    /// Connectivity, I/O, syntax, or any other driver error.
    Other,
}

impl FaultKind {
    /// Classifies a rusqlite error by its SQLite extended result code.
    pub fn classify(err: &rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => FaultKind::UniqueViolation,
                    _ => FaultKind::Constraint,
                }
            }
            _ => FaultKind::Other,
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The table, a column, or a value failed schema validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The insert statement ran but reported zero affected rows.
    #[error("data was not inserted into {0}, check input")]
    InsertFailed(String),

    /// The driver raised an error while opening, running, or closing.
    #[error("store fault: {source}")]
    StoreFault {
        kind: FaultKind,
        #[source]
        source: rusqlite::Error,
    },

    /// A stored value could not be mapped onto a model field.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A value that must be unique is already present.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A row the caller depends on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Store configuration could not be parsed or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// File I/O failure while reading configuration or init scripts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for a store fault caused by a duplicate unique value.
    ///
    /// Callers use this to turn a generic failure into a user-facing
    /// "already exists" message.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StoreError::StoreFault {
                kind: FaultKind::UniqueViolation,
                ..
            }
        )
    }

    /// Returns the fault classification, if this is a store fault.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            StoreError::StoreFault { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(source: rusqlite::Error) -> Self {
        StoreError::StoreFault {
            kind: FaultKind::classify(&source),
            source,
        }
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

/// Success payload XOR [`StoreError`].
pub type OperationResult<T> = std::result::Result<T, StoreError>;

/// Convenience alias matching the rest of the crate.
pub type Result<T> = OperationResult<T>;
