//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Non-GET method -> network only
//! 2. Path under the reserved API prefix -> network only
//! 3. Different origin -> network only
//! 4. Top-level navigation -> network first, cached shell on failure
//! 5. Anything else (same-origin sub-resource) -> cache first, revalidate in background

use reqwest::{Method, Url};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fetch::{FetchRequest, same_origin};

/// Caching policy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingDecision {
    /// Straight to the network, never cached.
    NetworkOnly,
    /// Live fetch; the cached shell document if the network is unreachable.
    NetworkFirstFallbackCache,
    /// Cached copy immediately when present, refreshed in the background.
    CacheFirstRevalidate,
}

impl RoutingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::NetworkOnly => "NETWORK_ONLY",
            RoutingDecision::NetworkFirstFallbackCache => "NETWORK_FIRST_FALLBACK_CACHE",
            RoutingDecision::CacheFirstRevalidate => "CACHE_FIRST_REVALIDATE",
        }
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure classifier over method, origin and path prefix.
#[derive(Debug, Clone)]
pub struct Router {
    origin: Url,
    api_prefix: String,
}

impl Router {
    pub fn new(origin: Url, api_prefix: impl Into<String>) -> Self {
        Self { origin, api_prefix: api_prefix.into() }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn route(&self, request: &FetchRequest) -> RoutingDecision {
        if request.method != Method::GET {
            return RoutingDecision::NetworkOnly;
        }

        if self.is_api_path(request.url.path()) {
            return RoutingDecision::NetworkOnly;
        }

        if !same_origin(&request.url, &self.origin) {
            return RoutingDecision::NetworkOnly;
        }

        if request.navigation {
            return RoutingDecision::NetworkFirstFallbackCache;
        }

        RoutingDecision::CacheFirstRevalidate
    }

    /// Whether `path` falls under the reserved API prefix.
    ///
    /// `/api` itself matches a `/api/` prefix; `/apiary` does not.
    pub fn is_api_path(&self, path: &str) -> bool {
        let bare = self.api_prefix.trim_end_matches('/');
        if path == bare {
            return true;
        }
        path.strip_prefix(bare).is_some_and(|rest| rest.starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new(Url::parse("http://localhost:5000").unwrap(), "/api/")
    }

    fn request(method: Method, url: &str, navigation: bool) -> FetchRequest {
        FetchRequest::new(method, Url::parse(url).unwrap(), navigation)
    }

    #[test]
    fn test_non_get_is_network_only() {
        let router = router();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD, Method::OPTIONS] {
            for navigation in [true, false] {
                let req = request(method.clone(), "http://localhost:5000/static/app.js", navigation);
                assert_eq!(router.route(&req), RoutingDecision::NetworkOnly, "{method} navigation={navigation}");
            }
        }
    }

    #[test]
    fn test_api_prefix_is_network_only_for_any_origin_or_method() {
        let router = router();
        let urls = [
            "http://localhost:5000/api/workouts",
            "http://localhost:5000/api/auth/user",
            "http://localhost:5000/api",
            "https://cdn.example.com/api/thing",
        ];
        for url in urls {
            for method in [Method::GET, Method::POST] {
                for navigation in [true, false] {
                    let req = request(method.clone(), url, navigation);
                    assert_eq!(router.route(&req), RoutingDecision::NetworkOnly, "{method} {url}");
                }
            }
        }
    }

    #[test]
    fn test_api_prefix_is_path_segment_aware() {
        let router = router();
        assert!(!router.is_api_path("/apiary/logo.png"));
        assert!(router.is_api_path("/api/"));
        assert_eq!(
            router.route(&request(Method::GET, "http://localhost:5000/apiary/logo.png", false)),
            RoutingDecision::CacheFirstRevalidate
        );
    }

    #[test]
    fn test_cross_origin_is_network_only() {
        let router = router();
        let urls = [
            "https://fonts.googleapis.com/css2?family=Inter",
            "http://localhost:5001/static/app.js",
            "https://localhost:5000/static/app.js",
        ];
        for url in urls {
            for navigation in [true, false] {
                let req = request(Method::GET, url, navigation);
                assert_eq!(router.route(&req), RoutingDecision::NetworkOnly, "{url}");
            }
        }
    }

    #[test]
    fn test_navigation_is_network_first() {
        let router = router();
        let req = request(Method::GET, "http://localhost:5000/dashboard", true);
        assert_eq!(router.route(&req), RoutingDecision::NetworkFirstFallbackCache);
    }

    #[test]
    fn test_subresource_is_cache_first() {
        let router = router();
        let req = request(Method::GET, "http://localhost:5000/static/app.js", false);
        assert_eq!(router.route(&req), RoutingDecision::CacheFirstRevalidate);
    }

    #[test]
    fn test_decision_serializes_screaming_case() {
        let json = serde_json::to_string(&RoutingDecision::NetworkFirstFallbackCache).unwrap();
        assert_eq!(json, "\"NETWORK_FIRST_FALLBACK_CACHE\"");
        assert_eq!(RoutingDecision::CacheFirstRevalidate.to_string(), "CACHE_FIRST_REVALIDATE");
    }
}
