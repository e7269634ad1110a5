use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::models::visit::{GeoRecord, NewVisit, Visit};

use super::{StoreError, VisitStore};

/// Visit store backed by a single SQLite table.
///
/// Inserts are single-row statements serialised through the connection mutex,
/// so concurrent captures never overwrite each other.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn new(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS visits (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                ip          TEXT NOT NULL,
                geo         TEXT NOT NULL,
                user_agent  TEXT NOT NULL,
                referrer    TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl VisitStore for SqliteStore {
    fn append(&self, visit: NewVisit) -> Result<Visit, StoreError> {
        let geo_json = serde_json::to_string(&visit.geo)?;
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        conn.execute(
            "INSERT INTO visits (ip, geo, user_agent, referrer, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                visit.ip,
                geo_json,
                visit.user_agent,
                visit.referrer,
                visit.timestamp
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(visit.with_id(id))
    }

    fn recent(&self, limit: usize) -> Result<Vec<Visit>, StoreError> {
        let conn = self.conn.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, ip, geo, user_agent, referrer, timestamp
             FROM visits ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let geo: String = row.get(2)?;
            Ok(Visit {
                id: row.get(0)?,
                ip: row.get(1)?,
                // A geo column that no longer parses renders as all-N/A.
                geo: serde_json::from_str::<GeoRecord>(&geo).unwrap_or_default(),
                user_agent: row.get(3)?,
                referrer: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
