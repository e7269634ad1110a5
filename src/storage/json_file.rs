use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::models::visit::{NewVisit, Visit};

use super::{StoreError, VisitStore};

/// Visit store kept as one pretty-printed JSON array on disk.
///
/// Every append rewrites the whole document. The read-modify-write runs under
/// `write_lock`, and the new document is renamed over the old one, so readers
/// never observe a half-written file.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read every stored visit in insertion order.
    ///
    /// A missing file is empty. Records written without an `id` get their
    /// 1-based position.
    fn read_all(&self) -> Result<Vec<Visit>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut visits: Vec<Visit> = serde_json::from_str(&content)?;
        for (i, visit) in visits.iter_mut().enumerate() {
            if visit.id == 0 {
                visit.id = i as i64 + 1;
            }
        }
        Ok(visits)
    }

    /// Move an unparsable log aside so the next write starts a fresh one
    /// without destroying the old contents.
    fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let corrupt = self.sibling(".corrupt");
        fs::rename(&self.path, &corrupt)?;
        Ok(corrupt)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "visits.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn save(&self, visits: &[Visit]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(visits)?;
        let tmp = self.sibling(".tmp");

        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl VisitStore for JsonFileStore {
    fn append(&self, visit: NewVisit) -> Result<Visit, StoreError> {
        let _guard = self.write_lock.lock();

        let mut visits = match self.read_all() {
            Ok(v) => v,
            Err(StoreError::Json(e)) => {
                let moved_to = self.quarantine()?;
                warn!(
                    path = %self.path.display(),
                    moved_to = %moved_to.display(),
                    error = %e,
                    "Visit log is corrupt, moved aside and starting a new one"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let id = visits.iter().map(|v| v.id).max().unwrap_or(0) + 1;
        let stored = visit.with_id(id);
        visits.push(stored.clone());
        self.save(&visits)?;

        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<Visit>, StoreError> {
        let visits = match self.read_all() {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read visit log, treating as empty");
                Vec::new()
            }
        };
        Ok(visits.into_iter().rev().take(limit).collect())
    }
}
