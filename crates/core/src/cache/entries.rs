//! Cached response entries.
//!
//! Entries are written on install (the shell set) and on successful
//! background refetch. They are never deleted one by one; they go away
//! with their generation.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Response headers kept alongside a cached body.
pub const STORED_HEADERS: &[&str] = &["content-type", "content-length", "cache-control", "etag", "last-modified"];

/// A stored response for one request identity within a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheEntry {
    /// Build an entry for `method url`, keeping only the [`STORED_HEADERS`] subset.
    pub fn new(
        method: &str, url: &str, status_code: u16, headers: impl IntoIterator<Item = (String, String)>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        let method = method.to_ascii_uppercase();
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .filter(|(name, _)| STORED_HEADERS.contains(&name.as_str()))
            .collect();

        Self {
            key_hash: compute_cache_key(&method, url),
            method,
            url: url.to_string(),
            status_code,
            headers,
            body: body.into(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// First value of a stored header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Create the generation row if it is missing (open semantics).
pub(crate) fn ensure_generation(conn: &rusqlite::Connection, generation: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
        params![generation, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_entry(conn: &rusqlite::Connection, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&entry.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;

    conn.execute(
        "INSERT INTO entries (generation, key_hash, method, url, status_code, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(generation, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status_code = excluded.status_code,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            generation,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.status_code,
            headers_json,
            &entry.body,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or overwrite an entry in `generation`, creating the generation if needed.
    ///
    /// Concurrent writers for the same key resolve last-write-wins.
    pub async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        let generation = generation.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation)?;
                upsert_entry(&tx, &generation, &entry)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite an entry only while `generation` still exists.
    ///
    /// Returns false, writing nothing, once the generation has been deleted.
    pub async fn refresh_entry(&self, generation: &str, entry: &CacheEntry) -> Result<bool, Error> {
        let generation = generation.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                let exists: bool = tx.query_row(
                    "SELECT EXISTS (SELECT 1 FROM generations WHERE name = ?1)",
                    params![generation],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Ok(false);
                }
                upsert_entry(&tx, &generation, &entry)?;
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries atomically.
    ///
    /// Either the generation exists afterwards with every entry in place,
    /// or nothing was written.
    pub async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        let generation = generation.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation)?;
                for entry in &entries {
                    upsert_entry(&tx, &generation, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by request identity.
    ///
    /// Returns None if the generation or the entry doesn't exist.
    pub async fn get_entry(&self, generation: &str, method: &str, url: &str) -> Result<Option<CacheEntry>, Error> {
        let generation = generation.to_string();
        let key_hash = compute_cache_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status_code, headers_json, body, stored_at
                    FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u16>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                });

                match result {
                    Ok((key_hash, method, url, status_code, headers_json, body, stored_at)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                        Ok(Some(CacheEntry { key_hash, method, url, status_code, headers, body, stored_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored under `generation`.
    pub async fn count_entries(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(url: &str, body: &str) -> CacheEntry {
        CacheEntry::new(
            "GET",
            url,
            200,
            vec![
                ("Content-Type".to_string(), "application/javascript".to_string()),
                ("Set-Cookie".to_string(), "sid=secret".to_string()),
            ],
            body.as_bytes(),
        )
    }

    #[test]
    fn test_entry_keeps_header_subset() {
        let entry = make_entry("http://localhost:5000/static/app.js", "x");
        assert_eq!(entry.header("content-type"), Some("application/javascript"));
        assert_eq!(entry.header("set-cookie"), None);
        assert_eq!(entry.headers.len(), 1);
    }

    #[tokio::test]
    async fn test_put_and_get_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("http://localhost:5000/static/app.js", "console.log(1)");

        db.put_entry("gymgurus-v1", &entry).await.unwrap();

        let retrieved = db
            .get_entry("gymgurus-v1", "GET", "http://localhost:5000/static/app.js")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, entry);
    }

    #[tokio::test]
    async fn test_get_missing_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("gymgurus-v1", "GET", "http://localhost:5000/nope").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_entries_scoped_to_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("http://localhost:5000/static/app.js", "v1");
        db.put_entry("gymgurus-v1", &entry).await.unwrap();

        let other = db
            .get_entry("gymgurus-v2", "GET", "http://localhost:5000/static/app.js")
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "http://localhost:5000/static/app.js";
        db.put_entry("gymgurus-v1", &make_entry(url, "old")).await.unwrap();
        db.put_entry("gymgurus-v1", &make_entry(url, "new")).await.unwrap();

        let retrieved = db.get_entry("gymgurus-v1", "GET", url).await.unwrap().unwrap();
        assert_eq!(retrieved.body, b"new");
        assert_eq!(db.count_entries("gymgurus-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_entry_requires_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "http://localhost:5000/static/app.js";

        assert!(!db.refresh_entry("gymgurus-v1", &make_entry(url, "late")).await.unwrap());
        assert!(db.list_generations().await.unwrap().is_empty());

        db.open_generation("gymgurus-v1").await.unwrap();
        assert!(db.refresh_entry("gymgurus-v1", &make_entry(url, "fresh")).await.unwrap());
        let retrieved = db.get_entry("gymgurus-v1", "GET", url).await.unwrap().unwrap();
        assert_eq!(retrieved.body, b"fresh");

        db.delete_generation("gymgurus-v1").await.unwrap();
        assert!(!db.refresh_entry("gymgurus-v1", &make_entry(url, "stale")).await.unwrap());
        assert!(db.list_generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_entries_batch() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            make_entry("http://localhost:5000/", "<html></html>"),
            make_entry("http://localhost:5000/manifest.json", "{}"),
        ];

        db.put_entries("gymgurus-v1", &entries).await.unwrap();

        assert_eq!(db.count_entries("gymgurus-v1").await.unwrap(), 2);
    }
}
