//! HTTP response cache
//!
//! Responses are stored in a small SQLite database keyed by request method,
//! URL and query parameters. Each entry carries an expiry deadline derived
//! from the configured time-to-live. The cache is an explicit object owned
//! by the fetcher, so its lifetime is scoped to the crawl that opened it.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const CACHE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    cache_key TEXT PRIMARY KEY,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    body TEXT NOT NULL,
    stored_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_responses_expires ON responses(expires_at);
"#;

/// A response previously stored in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
}

/// SQLite-backed store of successful responses
pub struct ResponseCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl ResponseCache {
    /// Opens (or creates) a cache file
    ///
    /// Parent directories are created as needed. Expired entries are purged
    /// on open.
    pub fn open(path: &Path, ttl: Duration) -> crate::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Ok(Self::with_connection(conn, ttl)?)
    }

    /// Creates a cache that lives only as long as this value
    pub fn in_memory(ttl: Duration) -> Result<Self, rusqlite::Error> {
        Self::with_connection(Connection::open_in_memory()?, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(CACHE_SCHEMA_SQL)?;
        let cache = Self {
            conn: Mutex::new(conn),
            ttl,
        };
        let purged = cache.purge_expired()?;
        if purged > 0 {
            tracing::debug!("Purged {} expired cache entries", purged);
        }
        Ok(cache)
    }

    /// Looks up a fresh response for the request
    ///
    /// Expired entries are removed and reported as a miss.
    pub fn get(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Option<CachedResponse>, rusqlite::Error> {
        let key = cache_key(method, url, params);
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let row = conn
            .query_row(
                "SELECT status, body, expires_at FROM responses WHERE cache_key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((status, body, expires_at)) if expires_at > now => {
                Ok(Some(CachedResponse { status, body }))
            }
            Some(_) => {
                conn.execute("DELETE FROM responses WHERE cache_key = ?1", params![key])?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Stores a response, replacing any previous entry for the same request
    pub fn put(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        response: &CachedResponse,
    ) -> Result<(), rusqlite::Error> {
        let key = cache_key(method, url, params);
        let now = Utc::now().timestamp();
        let expires_at = now.saturating_add(self.ttl.as_secs() as i64);
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        conn.execute(
            "INSERT INTO responses (cache_key, method, url, status, body, stored_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(cache_key) DO UPDATE SET
                status = excluded.status,
                body = excluded.body,
                stored_at = excluded.stored_at,
                expires_at = excluded.expires_at",
            params![key, method, url, response.status, response.body, now, expires_at],
        )?;
        Ok(())
    }

    /// Removes every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> Result<usize, rusqlite::Error> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute("DELETE FROM responses WHERE expires_at <= ?1", params![now])
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> Result<u64, rusqlite::Error> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))
    }

    pub fn is_empty(&self) -> Result<bool, rusqlite::Error> {
        Ok(self.len()? == 0)
    }
}

/// Builds the cache key for a request
///
/// Parameters are sorted by name so the key does not depend on the order
/// they were supplied in.
pub fn cache_key(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b" ");
    hasher.update(url.as_bytes());
    for (name, value) in sorted {
        hasher.update(b"\n");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}
