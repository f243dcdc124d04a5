//! Store configuration.
//!
//! Defines the YAML-serializable settings used to open the database: where
//! the file lives, which initialization script to apply, and the per-handle
//! pragmas set on every connection.
//!
//! # Example YAML
//!
//! ```yaml
//! database: data/storage.db
//! init_script: data/init.sql
//! foreign_keys: true
//! busy_timeout_ms: 5000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::schema::INIT_SQL;

fn default_foreign_keys() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Settings for opening the store.
///
/// # Examples
///
/// ```
/// use exercise_tracker_sqlite::StoreConfig;
///
/// let config = StoreConfig::new("storage.db");
/// assert!(config.foreign_keys);
/// assert_eq!(config.busy_timeout_ms, 5000);
/// assert!(config.init_script.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database: PathBuf,
    /// Optional DDL script replacing the built-in [`INIT_SQL`].
    #[serde(default)]
    pub init_script: Option<PathBuf>,
    /// Enforce foreign keys on every connection.
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    /// Creates a configuration with default settings for `database`.
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            init_script: None,
            foreign_keys: default_foreign_keys(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read, or
    /// [`StoreError::Config`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: StoreConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written, or
    /// [`StoreError::Config`] if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns the initialization script: the configured file's contents, or
    /// the built-in [`INIT_SQL`] when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the configured script cannot be read.
    pub fn resolve_init_sql(&self) -> Result<String> {
        match &self.init_script {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => Ok(INIT_SQL.to_string()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database.as_os_str().is_empty() {
            return Err(StoreError::Config("database path cannot be empty".to_string()));
        }
        Ok(())
    }
}
