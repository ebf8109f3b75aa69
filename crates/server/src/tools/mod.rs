//! MCP tool implementations.
//!
//! This module contains all tools exposed by the gymgurus-sw server.

pub mod cache;
pub mod lifecycle;
pub mod notification;
pub mod sw_fetch;

pub use notification::{NotificationClickParams, NotificationPushParams};
pub use sw_fetch::{SwFetchOutput, SwFetchParams};

#[cfg(test)]
pub(crate) mod testing {
    use gymgurus_client::{Coordinator, CoordinatorSettings, FetchClient, FetchConfig};
    use gymgurus_core::{AppConfig, CacheDb};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;

    /// Coordinator whose origin refuses connections (discard port on loopback).
    pub fn unreachable_coordinator(cache: &CacheDb) -> Coordinator {
        let config = AppConfig { origin: "http://127.0.0.1:9".to_string(), timeout_ms: 2_000, ..AppConfig::default() };
        let fetcher = FetchClient::new(FetchConfig::from_app_config(&config)).unwrap();
        let settings = CoordinatorSettings::from_app_config(&config).unwrap();

        Coordinator::new(settings, Arc::new(cache.clone()), Arc::new(fetcher)).unwrap()
    }

    /// Decode the JSON text content of a tool result.
    pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
