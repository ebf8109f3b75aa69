//! notification_push and notification_click tool implementations.
//!
//! Push data arrives as text. JSON objects are read for title/body/url; any
//! other text becomes the notification body.

use gymgurus_client::{Coordinator, WindowClient};
use gymgurus_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the notification_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationPushParams {
    /// Raw push message data, if the push carried any.
    #[serde(default)]
    pub data: Option<String>,
}

/// Parameters for the notification_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// The url carried by the clicked notification (default: the root).
    #[serde(default)]
    pub url: Option<String>,

    /// Open windows controlled by the application.
    #[serde(default)]
    pub windows: Vec<WindowClient>,
}

/// Implementation of the notification_push tool.
pub fn push_impl(coordinator: &Coordinator, params: NotificationPushParams) -> Result<CallToolResult, McpError> {
    let notification = coordinator.notification(params.data.as_deref().map(str::as_bytes));
    tracing::debug!("showing notification {:?}", notification.title);

    let json = serde_json::to_string_pretty(&notification)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize notification: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the notification_click tool.
pub fn click_impl(coordinator: &Coordinator, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let action = coordinator.notification_click(params.url.as_deref(), &params.windows);

    let json = serde_json::to_string_pretty(&action)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize action: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
