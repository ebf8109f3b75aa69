//! sw_fetch tool implementation.
//!
//! The intercept handler: routes one request through the coordinator and
//! reports what was served and where it came from.

use gymgurus_client::{Coordinator, FetchRequest, Method, ResponseSource, RoutingDecision};
use gymgurus_core::Error;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL or a path on the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Whether this is a top-level document load.
    #[serde(default)]
    pub navigation: bool,

    /// Wait for the background revalidation (and its cache write) before returning.
    #[serde(default)]
    pub wait_for_refresh: bool,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    pub decision: RoutingDecision,
    pub source: ResponseSource,
    pub status: u16,
    pub headers: Vec<HeaderField>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
    /// True when a background revalidation was started and not awaited.
    pub refreshing: bool,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(coordinator: &Coordinator, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let method = parse_method(&params.method)?;
    let url = coordinator.resolve(&params.url)?;

    let intercepted = coordinator
        .intercept(FetchRequest::new(method.clone(), url.clone(), params.navigation))
        .await?;

    let refreshing = match intercepted.refresh {
        Some(refresh) if params.wait_for_refresh => {
            refresh.finished().await;
            false
        }
        Some(_) => true,
        None => false,
    };

    let response = intercepted.response;
    let output = SwFetchOutput {
        url: url.to_string(),
        method: method.to_string(),
        decision: intercepted.decision,
        source: response.source,
        status: response.status,
        headers: response
            .headers
            .into_iter()
            .map(|(name, value)| HeaderField { name, value })
            .collect(),
        body: String::from_utf8_lossy(&response.body).to_string(),
        body_bytes: response.body.len(),
        refreshing,
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_method(input: &str) -> Result<Method, Error> {
    let normalized = input.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()));
    }
    Method::from_bytes(normalized.as_bytes()).map_err(|_| Error::InvalidInput(format!("invalid method: {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::unreachable_coordinator;
    use gymgurus_core::CacheDb;

    fn params(url: &str, method: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: method.into(), navigation: false, wait_for_refresh: false }
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert_eq!(parse_method(" GET ").unwrap(), Method::GET);
        assert!(parse_method("").is_err());
        assert!(parse_method("GE T").is_err());
    }

    #[tokio::test]
    async fn test_fetch_invalid_method() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let coordinator = unreachable_coordinator(&cache);

        let err = fetch_impl(&coordinator, params("/static/app.js", "")).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let coordinator = unreachable_coordinator(&cache);

        let err = fetch_impl(&coordinator, params("  ", "GET")).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }

    #[tokio::test]
    async fn test_fetch_network_failure_surfaces() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let coordinator = unreachable_coordinator(&cache);

        let result = fetch_impl(&coordinator, params("/api/workouts", "POST")).await;
        assert!(result.is_err());
    }
}
