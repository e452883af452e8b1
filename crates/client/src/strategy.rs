//! Caching strategies and their dispatch by request class.
//!
//! - Navigations are served network-first. A successful response is written
//!   back in the background and the live response is returned immediately.
//!   When the network fails the fallback chain takes over.
//! - Static assets are served cache-first. On a miss the network response is
//!   stored before it is returned, and an unreachable asset becomes a
//!   synthesized 404.
//!
//! Cache read errors are treated as misses; write errors are logged. Neither
//! strategy ever returns an error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use swcache_core::{CacheStore, Error, Request, ResponseSnapshot, ResponseSource, Served};
use tokio::task::JoinSet;

use crate::classify::RequestClass;
use crate::fallback::FallbackResolver;
use crate::fetch::Network;

/// Look up `request`, logging and swallowing store errors.
pub(crate) async fn lookup(store: &CacheStore, request: &Request) -> Option<ResponseSnapshot> {
    match store.match_request(request).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(url = %request.url(), error = %e, "cache read failed, treating as miss");
            None
        }
    }
}

fn log_fetch_error(request: &Request, error: &Error) {
    if error.is_network_failure() {
        tracing::debug!(url = %request.url(), %error, "network unavailable, falling back");
    } else {
        tracing::warn!(method = request.method(), url = %request.url(), %error, "request failed, falling back");
    }
}

/// Background write-backs that outlive the request that issued them.
///
/// Dropping the last handle aborts whatever is still pending, so call
/// [`WriteBacks::flush`] before shutting down.
#[derive(Clone, Default)]
pub struct WriteBacks {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl WriteBacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `response` for `request` without waiting for it.
    ///
    /// A failed write is logged and not retried.
    pub fn spawn(&self, store: CacheStore, request: Request, response: ResponseSnapshot) {
        let mut tasks = self.lock();
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            if let Err(e) = store.put(&request, response).await {
                tracing::warn!(
                    generation = store.generation(),
                    url = %request.url(),
                    error = %e,
                    "write-back failed"
                );
            }
        });
    }

    /// Wait for every write-back issued so far.
    pub async fn flush(&self) {
        let mut tasks = std::mem::take(&mut *self.lock());
        if !tasks.is_empty() {
            tracing::debug!(pending = tasks.len(), "flushing write-backs");
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::warn!("write-back task did not complete: {e}");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Applies the strategy selected by a request's class.
pub struct Dispatcher {
    network: Arc<dyn Network>,
    fallback: FallbackResolver,
    write_backs: WriteBacks,
}

impl Dispatcher {
    pub fn new(network: Arc<dyn Network>, fallback: FallbackResolver) -> Self {
        Self { network, fallback, write_backs: WriteBacks::new() }
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn write_backs(&self) -> &WriteBacks {
        &self.write_backs
    }

    /// Serve `request` with the strategy for `class`.
    ///
    /// Returns `None` for `RequestClass::Other`, which is never handled here.
    pub async fn dispatch(&self, class: RequestClass, request: &Request, store: &CacheStore) -> Option<Served> {
        match class {
            RequestClass::Navigation => Some(self.network_first(request, store).await),
            RequestClass::StaticAsset => Some(self.cache_first(request, store).await),
            RequestClass::Other => None,
        }
    }

    /// Network-first with background write-back.
    pub async fn network_first(&self, request: &Request, store: &CacheStore) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_backs
                        .spawn(store.clone(), request.clone(), response.clone());
                } else {
                    tracing::debug!(url = %request.url(), status = response.status, "not caching error response");
                }
                Served::new(response, ResponseSource::Network)
            }
            Err(e) => {
                log_fetch_error(request, &e);
                self.fallback.resolve(request, store).await
            }
        }
    }

    /// Cache-first; a miss goes to the network and is stored.
    pub async fn cache_first(&self, request: &Request, store: &CacheStore) -> Served {
        if let Some(hit) = lookup(store, request).await {
            tracing::debug!(url = %request.url(), "cache hit");
            return Served::new(hit, ResponseSource::Cache);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success()
                    && let Err(e) = store.put(request, response.clone()).await
                {
                    tracing::warn!(url = %request.url(), error = %e, "failed to store asset");
                }
                Served::new(response, ResponseSource::Network)
            }
            Err(e) => {
                log_fetch_error(request, &e);
                Served::new(FallbackResolver::not_found(), ResponseSource::Synthesized)
            }
        }
    }
}
