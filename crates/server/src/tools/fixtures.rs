//! Shared setup for the tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rmcp::model::CallToolResult;
use swcache_client::{FallbackResolver, Interceptor, LifecycleConfig, LifecycleController, Network};
use swcache_core::{CacheDb, Error, Request, ResponseSnapshot};
use url::Url;

pub(crate) const ORIGIN: &str = "https://app.example.com";

pub(crate) fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub(crate) fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

/// A small static site that can be switched offline.
pub(crate) struct StaticSite {
    pages: HashMap<String, ResponseSnapshot>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StaticSite {
    pub(crate) fn new() -> Self {
        let mut pages = HashMap::new();
        for (path, body) in [("/", "home"), ("/offline.html", "offline"), ("/pricing", "pricing"), ("/app.css", "body{}")] {
            pages.insert(url(path).to_string(), ResponseSnapshot::new(200, Vec::new(), body));
        }
        Self { pages, offline: AtomicBool::new(false), calls: AtomicUsize::new(0) }
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for StaticSite {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        Ok(self
            .pages
            .get(request.url().as_str())
            .cloned()
            .unwrap_or_else(|| ResponseSnapshot::synthesized(404, "missing")))
    }
}

/// An interceptor over an in-memory database, not yet installed.
pub(crate) async fn interceptor(site: Arc<StaticSite>) -> Interceptor {
    let db = CacheDb::open_in_memory().await.unwrap();
    let config = LifecycleConfig {
        version: "v1".into(),
        precache: vec![url("/"), url("/offline.html")],
        skip_waiting: true,
        claim_clients: true,
    };
    let lifecycle = Arc::new(LifecycleController::new(db, config));
    Interceptor::new(lifecycle, site, FallbackResolver::new(url("/offline.html")))
}

/// The text of the first content block.
pub(crate) fn text(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap()
}
