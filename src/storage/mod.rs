pub mod database;
pub mod legacy;
pub mod seed;

use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

pub use database::SqliteStore;
pub use legacy::JsonFileStore;
pub use seed::seed_welcome_snippet;

/// Name of the single record holding the whole snippet collection.
pub const RECORD_KEY: &str = "quickCopyData";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode stored data: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Whole-record key-value persistence. Reads and writes replace the full value.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError>;
}
