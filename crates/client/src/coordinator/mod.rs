//! Offline cache coordinator.
//!
//! Sits between the application and the network. Every intercepted request
//! is classified by the [`Router`] and served under one of three policies;
//! see [`RoutingDecision`].
//!
//! ### Lifecycle
//! - `install` fetches the shell set and writes it into the generation named
//!   by the version tag, all or nothing.
//! - `activate` purges every other generation and takes control of all
//!   requests immediately.
//! - Until activation, intercepted requests go straight to the network.
//!
//! ### Background revalidation
//! Cache-first responses spawn one refresh task per request. The task is
//! detached unless the caller awaits the returned [`RefreshHandle`]. Writes
//! from concurrent refreshes of the same key are last-write-wins.

mod policy;


use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::try_join_all;
use reqwest::Url;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use gymgurus_core::{AppConfig, CacheEntry, CacheStorage, Error};

use crate::fetch::{FetchRequest, FetchResponse, Fetcher, normalize, resolve};
use crate::notify::{Notification, NotificationDefaults, NotificationPayload, WindowAction, WindowClient, click_action};
use crate::route::{Router, RoutingDecision};

/// Status code of the synthetic response served when a navigation has no network and no shell.
pub const OFFLINE_STATUS: u16 = 503;

/// Where the coordinator is in its install/activate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Idle,
    Installed,
    Activated,
}

/// Origin of a served response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Offline,
}

/// The response handed back to the host for one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl ServedResponse {
    fn from_network(response: &FetchResponse) -> Self {
        Self {
            status: response.status.as_u16(),
            headers: response.header_pairs(),
            body: response.bytes.clone(),
            source: ResponseSource::Network,
        }
    }

    fn from_entry(entry: CacheEntry) -> Self {
        Self {
            status: entry.status_code,
            headers: entry.headers,
            body: Bytes::from(entry.body),
            source: ResponseSource::Cache,
        }
    }

    fn offline() -> Self {
        Self {
            status: OFFLINE_STATUS,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Bytes::from_static(b"Offline"),
            source: ResponseSource::Offline,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Handle to a detached background revalidation.
#[derive(Debug)]
pub struct RefreshHandle(JoinHandle<()>);

impl RefreshHandle {
    /// Wait for the refresh, including its cache write, to finish.
    pub async fn finished(self) {
        if let Err(e) = self.0.await {
            tracing::warn!("background revalidation task aborted: {}", e);
        }
    }
}

/// Result of intercepting one request.
#[derive(Debug)]
pub struct Intercepted {
    pub decision: RoutingDecision,
    pub response: ServedResponse,
    pub refresh: Option<RefreshHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    pub cached: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub generation: String,
    pub purged: Vec<String>,
}

/// Explicit inputs of a coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub origin: Url,
    /// Version tag; also the name of the generation this coordinator owns.
    pub version: String,
    pub shell_resources: Vec<String>,
    pub shell_document: String,
    pub api_prefix: String,
    pub notifications: NotificationDefaults,
}

impl CoordinatorSettings {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            origin,
            version: config.cache_version.clone(),
            shell_resources: config.shell_resources.clone(),
            shell_document: config.shell_document.clone(),
            api_prefix: config.api_prefix.clone(),
            notifications: NotificationDefaults::from_app_config(config),
        })
    }
}

pub struct Coordinator {
    generation: String,
    origin: Url,
    shell: Vec<Url>,
    shell_document: Url,
    notifications: NotificationDefaults,
    router: Router,
    store: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: RwLock<Lifecycle>,
}

impl Coordinator {
    /// Build an idle coordinator.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if a shell resource does not resolve against the origin,
    /// and `Error::InvalidInput` for an empty version tag, an empty shell set, or a
    /// shell document outside the shell set.
    pub fn new(
        settings: CoordinatorSettings, store: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, Error> {
        if settings.version.trim().is_empty() {
            return Err(Error::InvalidInput("version tag cannot be empty".into()));
        }
        if settings.shell_resources.is_empty() {
            return Err(Error::InvalidInput("shell set cannot be empty".into()));
        }

        let to_url = |path: &str| resolve(&settings.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")));

        let shell = settings
            .shell_resources
            .iter()
            .map(|path| to_url(path))
            .collect::<Result<Vec<_>, _>>()?;
        let shell_document = to_url(&settings.shell_document)?;
        if !shell.contains(&shell_document) {
            return Err(Error::InvalidInput(format!(
                "shell document {} is not in the shell set",
                settings.shell_document
            )));
        }

        Ok(Self {
            router: Router::new(settings.origin.clone(), settings.api_prefix),
            generation: settings.version,
            origin: settings.origin,
            shell,
            shell_document,
            notifications: settings.notifications,
            store,
            fetcher,
            lifecycle: RwLock::new(Lifecycle::Idle),
        })
    }

    /// Name of the generation this coordinator reads and writes.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read().await
    }

    /// Resolve a request target (absolute URL or origin-relative path).
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.origin, input).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Populate the current generation with the shell set.
    ///
    /// Every shell resource must come back with a 2xx status from its own
    /// URL. On any failure nothing is written and the lifecycle is unchanged.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        tracing::info!("installing generation {} ({} shell resources)", self.generation, self.shell.len());

        let fetches = self.shell.iter().map(|url| async move {
            let response = self
                .fetcher
                .fetch(&FetchRequest::get(url.clone()))
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;

            if !response.status.is_success() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status.as_u16())));
            }
            if response.redirected() {
                return Err(Error::InstallFailed(format!("{url}: redirected to {}", response.final_url)));
            }

            Ok::<_, Error>(CacheEntry::new(
                "GET",
                url.as_str(),
                response.status.as_u16(),
                response.header_pairs(),
                response.bytes.to_vec(),
            ))
        });

        let entries = try_join_all(fetches).await.inspect_err(|e| {
            tracing::warn!("install of {} aborted: {}", self.generation, e);
        })?;

        self.store
            .put_entries(&self.generation, &entries)
            .await
            .map_err(|e| Error::InstallFailed(format!("storing shell: {e}")))?;

        let mut lifecycle = self.lifecycle.write().await;
        if *lifecycle == Lifecycle::Idle {
            *lifecycle = Lifecycle::Installed;
        }

        tracing::info!("generation {} installed", self.generation);

        Ok(InstallReport {
            generation: self.generation.clone(),
            cached: self.shell.iter().map(|u| u.to_string()).collect(),
        })
    }

    /// Purge every other generation and take control of all requests.
    ///
    /// Repeating it is harmless: only the current generation survives.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        if self.lifecycle().await == Lifecycle::Idle {
            return Err(Error::NotInstalled(self.generation.clone()));
        }

        let mut purged = Vec::new();
        for name in self.store.list_generations().await? {
            if name == self.generation {
                continue;
            }
            if self.store.delete_generation(&name).await? {
                tracing::info!("purged stale generation {}", name);
                purged.push(name);
            }
        }

        *self.lifecycle.write().await = Lifecycle::Activated;
        tracing::info!("generation {} active, controlling all clients", self.generation);

        Ok(ActivateReport { generation: self.generation.clone(), purged })
    }

    /// Serve one intercepted request.
    ///
    /// The request URL is normalized first (lowercase host, no fragment), so
    /// it keys the cache the same way install does.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for non-http(s) targets. Network-only
    /// requests and cache misses surface the fetch error. Navigations to an
    /// http(s) URL never fail.
    pub async fn intercept(&self, mut request: FetchRequest) -> Result<Intercepted, Error> {
        request.url = normalize(request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        if self.lifecycle().await != Lifecycle::Activated {
            tracing::debug!("not in control yet, passing {} {} through", request.method, request.url);
            return self.network_only(request).await;
        }

        let decision = self.router.route(&request);
        tracing::debug!("{} {} -> {}", request.method, request.url, decision);

        match decision {
            RoutingDecision::NetworkOnly => self.network_only(request).await,
            RoutingDecision::NetworkFirstFallbackCache => Ok(self.network_first(request).await),
            RoutingDecision::CacheFirstRevalidate => self.cache_first_revalidate(request).await,
        }
    }

    /// Current generation's entry for `method url`, if any.
    pub async fn lookup(&self, method: &str, url: &Url) -> Result<Option<CacheEntry>, Error> {
        self.store.get_entry(&self.generation, method, url.as_str()).await
    }

    /// Build the notification to display for a push message.
    pub fn notification(&self, data: Option<&[u8]>) -> Notification {
        Notification::build(NotificationPayload::parse(data), &self.notifications, &self.origin)
    }

    /// Decide how to surface `url` (default: the root) when a notification is clicked.
    pub fn notification_click(&self, url: Option<&str>, windows: &[WindowClient]) -> WindowAction {
        let target = url
            .filter(|u| !u.trim().is_empty())
            .and_then(|u| self.resolve(u).ok())
            .unwrap_or_else(|| self.origin.join("/").unwrap_or_else(|_| self.origin.clone()));

        click_action(&target, windows)
    }
}
