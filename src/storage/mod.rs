pub mod json_file;
pub mod sqlite;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::settings::{StorageBackend, StorageConfig};
use crate::models::visit::{NewVisit, Visit};

use self::json_file::JsonFileStore;
use self::sqlite::SqliteStore;

/// Error types for visit persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only persistence of captured visits.
///
/// Implementations assign ids at append time and return records
/// most-recent-first from [`VisitStore::recent`].
pub trait VisitStore: Send + Sync {
    fn append(&self, visit: NewVisit) -> Result<Visit, StoreError>;

    fn recent(&self, limit: usize) -> Result<Vec<Visit>, StoreError>;
}

/// Open the backend selected in the configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn VisitStore>, StoreError> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::new(&config.sqlite_path)?;
            info!(path = %config.sqlite_path, "SQLite visit store opened");
            Ok(Arc::new(store))
        }
        StorageBackend::Json => {
            let store = JsonFileStore::new(&config.json_path);
            info!(path = %config.json_path, "JSON visit store opened");
            Ok(Arc::new(store))
        }
    }
}
