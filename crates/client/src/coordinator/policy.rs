//! The three serving policies.

use reqwest::{Method, Url};
use tokio::sync::oneshot;

use gymgurus_core::{CacheEntry, Error};

use super::{Coordinator, Intercepted, RefreshHandle, ServedResponse};
use crate::fetch::{FetchRequest, FetchResponse, same_origin};
use crate::route::RoutingDecision;

/// Whether a live response may be stored.
///
/// Only GET responses with a 2xx status that came from the application
/// origin without a redirect qualify.
pub(crate) fn is_cacheable(origin: &Url, request: &FetchRequest, response: &FetchResponse) -> bool {
    request.method == Method::GET
        && response.status.is_success()
        && !response.redirected()
        && same_origin(&response.final_url, origin)
}

impl Coordinator {
    pub(super) async fn network_only(&self, request: FetchRequest) -> Result<Intercepted, Error> {
        let response = self.fetcher.fetch(&request).await?;

        Ok(Intercepted {
            decision: RoutingDecision::NetworkOnly,
            response: ServedResponse::from_network(&response),
            refresh: None,
        })
    }

    /// Live document, or the cached shell when the network is unreachable.
    ///
    /// The live document is never stored.
    pub(super) async fn network_first(&self, request: FetchRequest) -> Intercepted {
        let response = match self.fetcher.fetch(&request).await {
            Ok(live) => ServedResponse::from_network(&live),
            Err(e) => {
                tracing::warn!("navigation to {} failed ({}), serving shell {}", request.url, e, self.shell_document);
                match self.store.get_entry(&self.generation, "GET", self.shell_document.as_str()).await {
                    Ok(Some(entry)) => ServedResponse::from_entry(entry),
                    Ok(None) => {
                        tracing::warn!("no cached shell in {}, serving offline response", self.generation);
                        ServedResponse::offline()
                    }
                    Err(e) => {
                        tracing::warn!("cache lookup for shell failed: {}", e);
                        ServedResponse::offline()
                    }
                }
            }
        };

        Intercepted { decision: RoutingDecision::NetworkFirstFallbackCache, response, refresh: None }
    }

    /// Stale-while-revalidate.
    ///
    /// The live fetch starts before the cache lookup. A hit is returned as
    /// soon as the lookup completes; a miss waits for the live fetch. The
    /// refresh writes only after the lookup has finished, so the value a
    /// request observed is never one it stored itself.
    pub(super) async fn cache_first_revalidate(&self, request: FetchRequest) -> Result<Intercepted, Error> {
        let (lookup_done_tx, lookup_done_rx) = oneshot::channel::<()>();
        let (live_tx, live_rx) = oneshot::channel::<Result<FetchResponse, Error>>();

        let fetcher = self.fetcher.clone();
        let store = self.store.clone();
        let generation = self.generation.clone();
        let origin = self.origin.clone();
        let refresh_request = request.clone();

        let task = tokio::spawn(async move {
            let result = fetcher.fetch(&refresh_request).await;

            let entry = match &result {
                Ok(live) if is_cacheable(&origin, &refresh_request, live) => Some(CacheEntry::new(
                    refresh_request.method.as_str(),
                    refresh_request.url.as_str(),
                    live.status.as_u16(),
                    live.header_pairs(),
                    live.bytes.to_vec(),
                )),
                Ok(live) => {
                    tracing::debug!(
                        "not caching {} (status {}, final url {})",
                        refresh_request.url,
                        live.status.as_u16(),
                        live.final_url
                    );
                    None
                }
                Err(e) => {
                    tracing::debug!("background revalidation of {} failed: {}", refresh_request.url, e);
                    None
                }
            };

            // Nobody is listening on a cache hit.
            let _ = live_tx.send(result);

            let _ = lookup_done_rx.await;

            if let Some(entry) = entry {
                match store.refresh_entry(&generation, &entry).await {
                    Ok(true) => tracing::debug!("refreshed {} in {}", refresh_request.url, generation),
                    Ok(false) => tracing::debug!("generation {} is gone, dropping refresh of {}", generation, refresh_request.url),
                    Err(e) => tracing::warn!("failed to store {}: {}", refresh_request.url, e),
                }
            }
        });
        let refresh = RefreshHandle(task);

        let cached = match self
            .store
            .get_entry(&self.generation, request.method.as_str(), request.url.as_str())
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("cache lookup for {} failed, treating as miss: {}", request.url, e);
                None
            }
        };
        let _ = lookup_done_tx.send(());

        let response = match cached {
            Some(entry) => {
                tracing::debug!("cache hit for {}", request.url);
                ServedResponse::from_entry(entry)
            }
            None => {
                tracing::debug!("cache miss for {}", request.url);
                let live = live_rx
                    .await
                    .map_err(|_| Error::HttpError(format!("fetch of {} was abandoned", request.url)))??;
                ServedResponse::from_network(&live)
            }
        };

        Ok(Intercepted { decision: RoutingDecision::CacheFirstRevalidate, response, refresh: Some(refresh) })
    }
}
