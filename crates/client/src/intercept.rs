//! Request interception boundary.

use std::sync::Arc;

use swcache_core::{Request, Served};

use crate::classify::{RequestClass, classify};
use crate::fallback::FallbackResolver;
use crate::fetch::Network;
use crate::lifecycle::LifecycleController;
use crate::strategy::Dispatcher;

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Perform the request against the network, unmodified.
    Passthrough,
    /// Answer with this response.
    Respond(Served),
}

/// Entry point for every outgoing request of the host.
pub struct Interceptor {
    lifecycle: Arc<LifecycleController>,
    dispatcher: Dispatcher,
}

impl Interceptor {
    pub fn new(lifecycle: Arc<LifecycleController>, network: Arc<dyn Network>, fallback: FallbackResolver) -> Self {
        Self { lifecycle, dispatcher: Dispatcher::new(network, fallback) }
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        self.dispatcher.network()
    }

    /// Classify `request` and serve it with the matching strategy.
    ///
    /// Requests are passed through untouched until the controller is active,
    /// and whenever they classify as [`RequestClass::Other`].
    pub async fn intercept(&self, request: &Request) -> Interception {
        let class = classify(request);
        if class == RequestClass::Other {
            tracing::debug!(method = request.method(), url = %request.url(), "passthrough");
            return Interception::Passthrough;
        }

        let Some(store) = self.lifecycle.current_store().await else {
            tracing::debug!(url = %request.url(), "no active generation, passthrough");
            return Interception::Passthrough;
        };

        match self.dispatcher.dispatch(class, request, &store).await {
            Some(served) => {
                tracing::debug!(url = %request.url(), %class, source = %served.source, status = served.response.status, "served");
                Interception::Respond(served)
            }
            None => Interception::Passthrough,
        }
    }

    /// Wait for pending background write-backs.
    pub async fn flush(&self) {
        self.dispatcher.write_backs().flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{LifecycleConfig, LifecycleState};
    use crate::test_support::{MockNetwork, html, url};
    use swcache_core::{CacheDb, Destination, ResponseSnapshot, ResponseSource};

    const MANIFEST: [&str; 4] = ["/", "/index.html", "/offline.html", "/manifest.webmanifest"];

    fn site() -> Arc<MockNetwork> {
        Arc::new(
            MockNetwork::new()
                .with_route("/", html("home"))
                .with_route("/index.html", html("home"))
                .with_route("/offline.html", html("offline"))
                .with_route("/manifest.webmanifest", ResponseSnapshot::new(200, Vec::new(), "{}"))
                .with_route("/pricing", html("pricing v1"))
                .with_route("/app.js", ResponseSnapshot::new(200, Vec::new(), "console.log(1)")),
        )
    }

    fn config(version: &str, precache: &[&str]) -> LifecycleConfig {
        LifecycleConfig {
            version: version.into(),
            precache: precache.iter().map(|p| url(p)).collect(),
            skip_waiting: true,
            claim_clients: true,
        }
    }

    async fn active(db: CacheDb, network: Arc<MockNetwork>, version: &str) -> Interceptor {
        let lifecycle = Arc::new(LifecycleController::new(db, config(version, &MANIFEST)));
        lifecycle.run(network.as_ref()).await.unwrap();
        Interceptor::new(lifecycle, network, FallbackResolver::new(url("/offline.html")))
    }

    fn respond(interception: Interception) -> Served {
        match interception {
            Interception::Respond(served) => served,
            Interception::Passthrough => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_passthrough_before_activation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = site();
        let lifecycle = Arc::new(LifecycleController::new(db, config("v1", &MANIFEST)));
        let interceptor = Interceptor::new(lifecycle.clone(), network.clone(), FallbackResolver::new(url("/offline.html")));

        let outcome = interceptor.intercept(&Request::navigate(url("/"))).await;
        assert_eq!(outcome, Interception::Passthrough);
        assert_eq!(network.calls(), 0);

        lifecycle.install(network.as_ref()).await.unwrap();
        assert_eq!(lifecycle.state().await, LifecycleState::Installed);
        assert_eq!(interceptor.intercept(&Request::navigate(url("/"))).await, Interception::Passthrough);
    }

    #[tokio::test]
    async fn test_other_requests_pass_through() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let interceptor = active(db, site(), "v1").await;

        let api = Request::get(url("/api/items"));
        assert_eq!(interceptor.intercept(&api).await, Interception::Passthrough);

        let post = Request::new("POST", url("/pricing")).with_mode(swcache_core::RequestMode::Navigate);
        assert_eq!(interceptor.intercept(&post).await, Interception::Passthrough);
    }

    #[tokio::test]
    async fn test_navigation_online_then_offline() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = site();
        let interceptor = active(db, network.clone(), "v1").await;
        let req = Request::navigate(url("/pricing"));

        let online = respond(interceptor.intercept(&req).await);
        assert_eq!(online.source, ResponseSource::Network);
        assert_eq!(online.response, html("pricing v1"));
        interceptor.flush().await;

        network.set_offline(true);
        let offline = respond(interceptor.intercept(&req).await);
        assert_eq!(offline.source, ResponseSource::Cache);
        assert_eq!(offline.response.body, online.response.body);
        assert_eq!(offline.response, online.response);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = site();
        let interceptor = active(db, network.clone(), "v1").await;
        network.set_offline(true);

        let served = respond(interceptor.intercept(&Request::navigate(url("/never-seen"))).await);
        assert_eq!(served.source, ResponseSource::OfflineFallback);
        assert_eq!(served.response, html("offline"));
    }

    #[tokio::test]
    async fn test_navigation_offline_without_offline_page() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = site();
        let lifecycle = Arc::new(LifecycleController::new(db, config("v1", &["/"])));
        lifecycle.run(network.as_ref()).await.unwrap();
        let interceptor = Interceptor::new(lifecycle, network.clone(), FallbackResolver::new(url("/offline.html")));
        network.set_offline(true);

        let served = respond(interceptor.intercept(&Request::navigate(url("/never-seen"))).await);
        assert_eq!(served.source, ResponseSource::Synthesized);
        assert_eq!(served.response.status, 503);
    }

    #[tokio::test]
    async fn test_asset_hit_makes_no_network_call() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = site();
        let interceptor = active(db, network.clone(), "v1").await;
        let req = Request::get(url("/app.js")).with_destination(Destination::Script);

        let first = respond(interceptor.intercept(&req).await);
        let calls = network.calls();
        let second = respond(interceptor.intercept(&req).await);

        assert_eq!(first.response, second.response);
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(network.calls(), calls);
    }

    #[tokio::test]
    async fn test_new_version_evicts_old_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = site();
        let v1 = active(db.clone(), network.clone(), "v1").await;
        let pricing = Request::navigate(url("/pricing"));
        respond(v1.intercept(&pricing).await);
        v1.flush().await;

        network.set_route("/pricing", html("pricing v2"));
        let v2 = active(db.clone(), network.clone(), "v2").await;
        let names: Vec<_> = db
            .list_generations()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["v2".to_string()]);

        network.set_offline(true);
        let served = respond(v2.intercept(&pricing).await);
        assert_eq!(served.source, ResponseSource::OfflineFallback);
    }

    #[tokio::test]
    async fn test_non_get_never_stored() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let interceptor = active(db, site(), "v1").await;

        for method in ["POST", "PUT", "DELETE"] {
            let req = Request::new(method, url("/pricing")).with_mode(swcache_core::RequestMode::Navigate);
            interceptor.intercept(&req).await;
        }
        interceptor.flush().await;

        let store = interceptor.lifecycle().current_store().await.unwrap();
        let keys = store.keys().await.unwrap();
        assert!(!keys.iter().any(|k| k.ends_with("/pricing")));
        assert_eq!(keys.len(), MANIFEST.len());
    }

    #[tokio::test]
    async fn test_restart_offline_serves_cached_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let network = site();
        let pricing = Request::navigate(url("/pricing"));

        let first = active(CacheDb::open(&path).await.unwrap(), network.clone(), "v1").await;
        respond(first.intercept(&pricing).await);
        first.flush().await;
        drop(first);

        network.set_offline(true);
        let restarted = active(CacheDb::open(&path).await.unwrap(), network, "v1").await;

        let served = respond(restarted.intercept(&pricing).await);
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response, html("pricing v1"));
    }
}
