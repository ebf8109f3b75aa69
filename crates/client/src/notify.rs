//! Push notification display and click handling.
//!
//! Fire-and-forget: nothing here is persisted and nothing is retried.

use reqwest::Url;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fetch::{canonicalize, resolve};

/// Structured push payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NotificationPayload {
    /// Decode raw push data.
    ///
    /// JSON objects are read field by field; any other non-empty data becomes the body.
    pub fn parse(data: Option<&[u8]>) -> Self {
        match data {
            None => Self::default(),
            Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Self::default(),
            Some(bytes) => serde_json::from_slice(bytes).unwrap_or_else(|_| Self {
                body: Some(String::from_utf8_lossy(bytes).trim().to_string()),
                ..Default::default()
            }),
        }
    }
}

/// Fallback values for fields the payload leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl NotificationDefaults {
    pub fn from_app_config(config: &gymgurus_core::AppConfig) -> Self {
        Self {
            title: config.notification_title.clone(),
            body: config.notification_body.clone(),
            icon: config.notification_icon.clone(),
        }
    }
}

/// A notification ready for the host to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Absolute URL opened or focused when the notification is clicked.
    pub url: String,
}

impl Notification {
    pub fn build(payload: NotificationPayload, defaults: &NotificationDefaults, origin: &Url) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let target = non_empty(payload.url).unwrap_or_else(|| "/".to_string());
        let url = match resolve(origin, &target) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("ignoring notification url {}: {}", target, e);
                origin.join("/").unwrap_or_else(|_| origin.clone())
            }
        };

        Self {
            title: non_empty(payload.title).unwrap_or_else(|| defaults.title.clone()),
            body: non_empty(payload.body).unwrap_or_else(|| defaults.body.clone()),
            icon: defaults.icon.clone(),
            badge: defaults.icon.clone(),
            url: url.to_string(),
        }
    }
}

/// An open window reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// What the host should do in response to a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WindowAction {
    /// Bring an already-open window at the target URL to the front.
    Focus { id: String, url: String },
    /// Open a new window at the target URL.
    Open { url: String },
}

/// Focus the first window already showing `target`, otherwise open one.
pub fn click_action(target: &Url, windows: &[WindowClient]) -> WindowAction {
    let open = windows
        .iter()
        .find(|w| canonicalize(&w.url).is_ok_and(|url| url == *target));

    match open {
        Some(window) => WindowAction::Focus { id: window.id.clone(), url: target.to_string() },
        None => WindowAction::Open { url: target.to_string() },
    }
}
