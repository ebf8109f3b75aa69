//! cache_get tool implementation.
//!
//! Looks up the current generation's entry for a request identity.

use gymgurus_client::Coordinator;
use gymgurus_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or a path on the application origin.
    pub url: String,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(coordinator: &Coordinator, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = coordinator.resolve(&params.url)?;
    let method = params.method.trim().to_ascii_uppercase();

    let entry = coordinator
        .lookup(&method, &url)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{method} {url}")))?;

    let output = CacheGetOutput {
        generation: coordinator.generation().to_string(),
        key_hash: entry.key_hash,
        method: entry.method,
        url: entry.url,
        status_code: entry.status_code,
        headers: entry.headers,
        body: String::from_utf8_lossy(&entry.body).to_string(),
        body_bytes: entry.body.len(),
        stored_at: entry.stored_at,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
