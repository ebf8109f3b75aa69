//! cache_generations tool implementation.

use gymgurus_core::{CacheDb, Error, GenerationStats};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// Generation the running coordinator reads and writes.
    pub current: String,
    pub generations: Vec<GenerationStats>,
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl(cache: &CacheDb, current: &str) -> Result<CallToolResult, McpError> {
    let generations = cache.generation_stats().await?;

    let output = CacheGenerationsOutput { current: current.to_string(), generations };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generations_empty() {
        let cache = CacheDb::open_in_memory().await.unwrap();

        let result = generations_impl(&cache, "gymgurus-v1").await.unwrap();
        assert!(!result.content.is_empty());
    }

    #[tokio::test]
    async fn test_generations_lists_all() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        cache.open_generation("gymgurus-v1").await.unwrap();
        cache.open_generation("gymgurus-v2").await.unwrap();

        assert!(generations_impl(&cache, "gymgurus-v2").await.is_ok());
        assert_eq!(cache.generation_stats().await.unwrap().len(), 2);
    }
}
