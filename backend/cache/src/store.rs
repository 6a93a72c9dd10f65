use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, info};

/// One stored extraction result. `payload` is already guard-encoded when
/// the entry was flagged sensitive. Entries are immutable; a different
/// payload for the same fingerprint replaces the row wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.created_at + ChronoDuration::seconds(self.ttl_secs as i64)
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

/// Backend interface shared by the durable store and the in-process
/// fallback. Expiry is lazy on `get`; `sweep` bounds growth between gets.
pub trait CacheStore: Send + Sync {
    fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError>;
    fn put(&self, entry: CacheEntry) -> Result<(), CacheError>;
    fn invalidate(&self, fingerprint: &str) -> Result<(), CacheError>;
    fn sweep(&self) -> Result<(), CacheError>;
}

/// SQLite-backed shared store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!(path = %path.as_ref().display(), "result cache store opened");
        Ok(store)
    }

    /// In-memory SQLite store (for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), CacheError> {
        let conn = self.conn.lock().expect("cache store lock poisoned");
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                fingerprint TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                created_at TEXT NOT NULL,
                ttl_secs INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.conn.lock().expect("cache store lock poisoned");
        let row: Option<(Vec<u8>, String, i64)> = conn
            .query_row(
                "SELECT payload, created_at, ttl_secs FROM entries WHERE fingerprint = ?1",
                params![fingerprint],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((payload, created_at, ttl_secs)) = row else {
            return Ok(None);
        };
        let created_at = created_at
            .parse::<DateTime<Utc>>()
            .map_err(|e| CacheError::Storage(format!("bad created_at: {e}")))?;
        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            payload,
            created_at,
            ttl_secs: ttl_secs.max(0) as u64,
        };

        if entry.is_expired_at(Utc::now()) {
            conn.execute(
                "DELETE FROM entries WHERE fingerprint = ?1",
                params![fingerprint],
            )?;
            debug!(fingerprint, "expired entry dropped on read");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let conn = self.conn.lock().expect("cache store lock poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO entries (fingerprint, payload, created_at, ttl_secs)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.fingerprint,
                entry.payload,
                entry.created_at.to_rfc3339(),
                entry.ttl_secs as i64,
            ],
        )?;
        Ok(())
    }

    fn invalidate(&self, fingerprint: &str) -> Result<(), CacheError> {
        let conn = self.conn.lock().expect("cache store lock poisoned");
        conn.execute(
            "DELETE FROM entries WHERE fingerprint = ?1",
            params![fingerprint],
        )?;
        Ok(())
    }

    fn sweep(&self) -> Result<(), CacheError> {
        let conn = self.conn.lock().expect("cache store lock poisoned");
        // created_at is RFC 3339 text; expiry is computed here, not in SQL
        let mut stmt = conn.prepare("SELECT fingerprint, created_at, ttl_secs FROM entries")?;
        let now = Utc::now();
        let expired: Vec<String> = stmt
            .query_map([], |row| {
                let fingerprint: String = row.get(0)?;
                let created_at: String = row.get(1)?;
                let ttl_secs: i64 = row.get(2)?;
                Ok((fingerprint, created_at, ttl_secs))
            })?
            .filter_map(Result::ok)
            .filter(|(_, created_at, ttl_secs)| {
                created_at
                    .parse::<DateTime<Utc>>()
                    .map(|t| now > t + ChronoDuration::seconds(*ttl_secs))
                    .unwrap_or(true)
            })
            .map(|(fingerprint, _, _)| fingerprint)
            .collect();

        for fingerprint in &expired {
            conn.execute(
                "DELETE FROM entries WHERE fingerprint = ?1",
                params![fingerprint],
            )?;
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "swept expired cache entries");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fingerprint: &str, payload: &[u8], ttl_secs: u64) -> CacheEntry {
        CacheEntry {
            fingerprint: fingerprint.into(),
            payload: payload.to_vec(),
            created_at: Utc::now(),
            ttl_secs,
        }
    }

    #[test]
    fn test_put_get_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(entry("fp1", b"payload", 60)).unwrap();
        let got = store.get("fp1").unwrap().unwrap();
        assert_eq!(got.payload, b"payload");
    }

    #[test]
    fn test_missing_fingerprint_is_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_expired_entry_dropped_on_get() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(entry("fp1", b"payload", 0)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(store.get("fp1").unwrap().is_none());
    }

    #[test]
    fn test_replace_overwrites_payload() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(entry("fp1", b"old", 60)).unwrap();
        store.put(entry("fp1", b"new", 60)).unwrap();
        assert_eq!(store.get("fp1").unwrap().unwrap().payload, b"new");
    }

    #[test]
    fn test_sweep_removes_expired_only() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(entry("dead", b"x", 0)).unwrap();
        store.put(entry("live", b"y", 600)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        store.sweep().unwrap();
        assert!(store.get("live").unwrap().is_some());

        let conn = store.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let store = SqliteStore::in_memory().unwrap();
        store.put(entry("fp1", b"payload", 60)).unwrap();
        store.invalidate("fp1").unwrap();
        assert!(store.get("fp1").unwrap().is_none());
    }
}
