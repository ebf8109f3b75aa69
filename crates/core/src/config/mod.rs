//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GYMGURUS_SW_*)
//! 2. TOML config file (if GYMGURUS_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GYMGURUS_SW_*)
/// 2. TOML config file (if GYMGURUS_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via GYMGURUS_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// The application's own origin. Requests to any other origin are never cached.
    ///
    /// Set via GYMGURUS_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag naming the current cache generation.
    ///
    /// Changing it is the only way to invalidate previously cached entries;
    /// the old generation is purged on the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Resources cached unconditionally at install time.
    #[serde(default = "default_shell_resources")]
    pub shell_resources: Vec<String>,

    /// Shell resource served when a navigation cannot reach the network.
    #[serde(default = "default_shell_document")]
    pub shell_document: String,

    /// Reserved path prefix for API calls, which always go to the network.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via GYMGURUS_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via GYMGURUS_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via GYMGURUS_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    #[serde(default = "default_notification_body")]
    pub notification_body: String,

    /// Icon (and badge) attached to every notification.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./gymgurus-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_cache_version() -> String {
    "gymgurus-v1".into()
}

fn default_shell_resources() -> Vec<String> {
    vec!["/".into(), "/manifest.json".into(), "/icon-192.png".into()]
}

fn default_shell_document() -> String {
    "/".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_user_agent() -> String {
    "gymgurus-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_notification_title() -> String {
    "GymGurus".into()
}

fn default_notification_body() -> String {
    "You have a new notification".into()
}

fn default_notification_icon() -> String {
    "/icon-192.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            shell_resources: default_shell_resources(),
            shell_document: default_shell_document(),
            api_prefix: default_api_prefix(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            notification_title: default_notification_title(),
            notification_body: default_notification_body(),
            notification_icon: default_notification_icon(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `GYMGURUS_SW_`
    /// 2. TOML file from `GYMGURUS_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GYMGURUS_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GYMGURUS_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let parsed = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
            _ => Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL with a host".into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./gymgurus-sw-cache.sqlite"));
        assert_eq!(config.origin, "http://localhost:5000");
        assert_eq!(config.cache_version, "gymgurus-v1");
        assert_eq!(config.shell_resources, vec!["/", "/manifest.json", "/icon-192.png"]);
        assert_eq!(config.shell_document, "/");
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.user_agent, "gymgurus-sw/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.notification_title, "GymGurus");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig { origin: "https://GymGurus.example".into(), ..Default::default() };
        let origin = config.origin_url().unwrap();
        assert_eq!(origin.host_str(), Some("gymgurus.example"));
    }

    #[test]
    fn test_origin_url_rejects_non_http() {
        let config = AppConfig { origin: "file:///srv/app".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));

        let config = AppConfig { origin: "/relative".into(), ..Default::default() };
        assert!(config.origin_url().is_err());
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sw.toml",
                r#"
                cache_version = "gymgurus-v7"
                shell_resources = ["/", "/offline.html"]
                "#,
            )?;
            jail.set_env("GYMGURUS_SW_CONFIG_FILE", "sw.toml");
            jail.set_env("GYMGURUS_SW_TIMEOUT_MS", "5000");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.cache_version, "gymgurus-v7");
            assert_eq!(config.shell_resources, vec!["/", "/offline.html"]);
            assert_eq!(config.timeout_ms, 5000);
            assert_eq!(config.api_prefix, "/api/");
            Ok(())
        });
    }
}
