//! Cache inspection MCP tools.
//!
//! Read-only views over the generation store; writes only happen through
//! install and background revalidation.

pub mod generations;
pub mod get;

pub use generations::generations_impl;
pub use get::{CacheGetParams, get_impl};
