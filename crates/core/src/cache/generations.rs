//! Generation lifecycle operations: open, list, delete.

use super::connection::CacheDb;
use super::entries::ensure_generation;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Summary of one generation for inspection tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerationStats {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

impl CacheDb {
    /// Open a generation, creating it if absent.
    pub async fn open_generation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_generation(conn, &name) })
            .await
            .map_err(Error::from)
    }

    /// Names of every generation in the store, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry in it.
    ///
    /// Returns false if no generation by that name existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Every generation with its entry count.
    pub async fn generation_stats(&self) -> Result<Vec<GenerationStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, COUNT(e.key_hash), g.created_at
                    FROM generations g LEFT JOIN entries e ON e.generation = g.name
                    GROUP BY g.name, g.created_at
                    ORDER BY g.created_at ASC, g.name ASC",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(GenerationStats {
                            name: row.get(0)?,
                            entries: row.get::<_, i64>(1)? as u64,
                            created_at: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("gymgurus-v1").await.unwrap();
        db.open_generation("gymgurus-v1").await.unwrap();

        assert_eq!(db.list_generations().await.unwrap(), vec!["gymgurus-v1"]);
    }

    #[tokio::test]
    async fn test_delete_generation_removes_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = CacheEntry::new("GET", "http://localhost:5000/", 200, Vec::new(), "shell");
        db.put_entry("gymgurus-v1", &entry).await.unwrap();
        db.put_entry("gymgurus-v2", &entry).await.unwrap();

        assert!(db.delete_generation("gymgurus-v1").await.unwrap());

        assert_eq!(db.list_generations().await.unwrap(), vec!["gymgurus-v2"]);
        assert_eq!(db.count_entries("gymgurus-v1").await.unwrap(), 0);
        assert_eq!(db.count_entries("gymgurus-v2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.delete_generation("never-created").await.unwrap());
    }

    #[tokio::test]
    async fn test_generation_stats() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("empty").await.unwrap();
        let entry = CacheEntry::new("GET", "http://localhost:5000/", 200, Vec::new(), "shell");
        db.put_entry("gymgurus-v1", &entry).await.unwrap();

        let stats = db.generation_stats().await.unwrap();
        let counts: Vec<(String, u64)> = stats.into_iter().map(|s| (s.name, s.entries)).collect();
        assert!(counts.contains(&("empty".to_string(), 0)));
        assert!(counts.contains(&("gymgurus-v1".to_string(), 1)));
    }
}
