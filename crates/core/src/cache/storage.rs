//! Cache store abstraction consumed by the coordinator.

use super::connection::CacheDb;
use super::entries::CacheEntry;
use crate::Error;
use async_trait::async_trait;

/// Key-value cache store organised into named generations.
///
/// Writes are idempotent per key and may race; implementations resolve
/// concurrent puts last-write-wins. `CacheDb` serializes every operation on
/// one connection thread, so a read issued after a write waits for it.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if absent.
    async fn open_generation(&self, name: &str) -> Result<(), Error>;

    /// Names of every existing generation.
    async fn list_generations(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation with all of its entries.
    async fn delete_generation(&self, name: &str) -> Result<bool, Error>;

    /// Look up the entry for `method url` in `generation`.
    async fn get_entry(&self, generation: &str, method: &str, url: &str) -> Result<Option<CacheEntry>, Error>;

    /// Store or overwrite one entry.
    async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error>;

    /// Store or overwrite one entry if `generation` still exists; never creates it.
    async fn refresh_entry(&self, generation: &str, entry: &CacheEntry) -> Result<bool, Error>;

    /// Store a batch atomically, creating the generation in the same step.
    async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open_generation(&self, name: &str) -> Result<(), Error> {
        CacheDb::open_generation(self, name).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        CacheDb::list_generations(self).await
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        CacheDb::delete_generation(self, name).await
    }

    async fn get_entry(&self, generation: &str, method: &str, url: &str) -> Result<Option<CacheEntry>, Error> {
        CacheDb::get_entry(self, generation, method, url).await
    }

    async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        CacheDb::put_entry(self, generation, entry).await
    }

    async fn refresh_entry(&self, generation: &str, entry: &CacheEntry) -> Result<bool, Error> {
        CacheDb::refresh_entry(self, generation, entry).await
    }

    async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        CacheDb::put_entries(self, generation, entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cache_db_as_trait_object() {
        let store: Arc<dyn CacheStorage> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let entry = CacheEntry::new("GET", "http://localhost:5000/manifest.json", 200, Vec::new(), "{}");

        store.put_entry("gymgurus-v1", &entry).await.unwrap();
        let found = store
            .get_entry("gymgurus-v1", "GET", "http://localhost:5000/manifest.json")
            .await
            .unwrap();

        assert_eq!(found, Some(entry));
        assert_eq!(store.list_generations().await.unwrap(), vec!["gymgurus-v1"]);
    }
}
