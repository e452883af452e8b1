//! Offline fallback chain for failed navigations.

use swcache_core::{CacheStore, Request, ResponseSnapshot, ResponseSource, Served};
use url::Url;

use crate::strategy::lookup;

/// Body of the synthesized response when nothing else is available.
pub const OFFLINE_BODY: &str = "Offline: the requested page is not available without a network connection.";

/// Body of the synthesized response for an uncached, unreachable asset.
pub const NOT_FOUND_BODY: &str = "Not Found";

/// Resolves a best-effort response for a navigation the network could not serve.
///
/// The chain is, in order:
/// 1. the snapshot cached for the exact request,
/// 2. the snapshot cached for the offline fallback page,
/// 3. a synthesized `503 Service Unavailable`.
///
/// It always produces a response.
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    offline_page: Request,
}

impl FallbackResolver {
    pub fn new(offline_url: Url) -> Self {
        Self { offline_page: Request::get(offline_url) }
    }

    pub fn offline_url(&self) -> &Url {
        self.offline_page.url()
    }

    pub async fn resolve(&self, request: &Request, store: &CacheStore) -> Served {
        if let Some(hit) = lookup(store, request).await {
            tracing::debug!(url = %request.url(), "fallback: cached copy of request");
            return Served::new(hit, ResponseSource::Cache);
        }

        if let Some(page) = lookup(store, &self.offline_page).await {
            tracing::debug!(url = %request.url(), offline = %self.offline_url(), "fallback: offline page");
            return Served::new(page, ResponseSource::OfflineFallback);
        }

        tracing::warn!(url = %request.url(), "fallback: nothing cached, synthesizing 503");
        Served::new(Self::offline_response(), ResponseSource::Synthesized)
    }

    /// The last link of the navigation chain.
    pub fn offline_response() -> ResponseSnapshot {
        ResponseSnapshot::synthesized(503, OFFLINE_BODY)
    }

    /// The only fallback for static assets.
    pub fn not_found() -> ResponseSnapshot {
        ResponseSnapshot::synthesized(404, NOT_FOUND_BODY)
    }
}
