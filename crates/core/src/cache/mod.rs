//! Generation-scoped response cache.
//!
//! A generation is a named, versioned collection of request -> response
//! pairs. Exactly one generation is current for a given coordinator; the
//! others are purged when it activates.
//!
//! - [`CacheStorage`] is the store abstraction the coordinator consumes
//! - [`CacheDb`] implements it over SQLite via tokio-rusqlite (WAL mode)
//! - Entries are keyed by a SHA-256 of the normalized request identity

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use generations::GenerationStats;
pub use storage::CacheStorage;
