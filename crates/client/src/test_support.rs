//! Scripted network doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use swcache_core::{Error, Request, ResponseSnapshot};
use url::Url;

use crate::fetch::Network;

pub(crate) const ORIGIN: &str = "https://app.example.com";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn html(body: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(200, vec![("content-type".into(), "text/html".into())], body.as_bytes())
}

/// Serves fixed responses by URL and counts every call.
#[derive(Default)]
pub(crate) struct MockNetwork {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_route(self, path: &str, response: ResponseSnapshot) -> Self {
        self.set_route(path, response);
        self
    }

    pub(crate) fn set_route(&self, path: &str, response: ResponseSnapshot) {
        self.routes.lock().unwrap().insert(url(path).to_string(), response);
    }

    /// Make one URL fail at the network level.
    pub(crate) fn fail(&self, path: &str) {
        self.failing.lock().unwrap().insert(url(path).to_string());
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = request.url().to_string();

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&key) {
            return Err(Error::Network(format!("offline: {key}")));
        }

        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ResponseSnapshot::synthesized(404, "no route")))
    }
}

/// Never answers.
pub(crate) struct HangingNetwork;

#[async_trait::async_trait]
impl Network for HangingNetwork {
    async fn fetch(&self, _request: &Request) -> Result<ResponseSnapshot, Error> {
        std::future::pending().await
    }
}
