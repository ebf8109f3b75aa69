//! sw_install and sw_activate tool implementations.
//!
//! The host calls these in order; a failed install must not be followed by activate.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use gymgurus_client::Coordinator;
use gymgurus_core::Error;

/// Implementation of the sw_install tool.
pub async fn install_impl(coordinator: &Coordinator) -> Result<CallToolResult, McpError> {
    let report = coordinator.install().await?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(coordinator: &Coordinator) -> Result<CallToolResult, McpError> {
    let report = coordinator.activate().await?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
