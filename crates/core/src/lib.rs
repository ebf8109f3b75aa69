//! Core types and shared functionality for the GymGurus offline cache.
//!
//! This crate provides:
//! - Generation-scoped cache store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, CacheStorage, GenerationStats};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
