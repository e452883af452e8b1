//! Cache generation lifecycle.
//!
//! One controller per running process drives its generation through
//! `idle → installing → installed → activating → active`:
//!
//! - **install** fetches the whole precache manifest, then writes the new
//!   generation in a single transaction. Any failed fetch leaves nothing
//!   behind and puts the controller back to `idle` so the host can retry.
//! - **activate** deletes every generation whose tag is not the running
//!   version. The controller only reports `active` (and only hands out a
//!   [`CacheStore`]) once eviction has finished.
//! - **resume** activates a generation of the running version that an
//!   earlier process already installed. Install commits in one transaction,
//!   so a generation on disk is always complete.

use std::fmt;

use serde::Serialize;
use swcache_core::{AppConfig, CacheDb, CacheEntry, CacheStore, Error, Request};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Network, canonicalize};

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Not installed yet, or the last install failed.
    Idle,
    Installing,
    Installed,
    Activating,
    /// Serving requests from the current generation.
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        };
        f.write_str(s)
    }
}

/// Build-time inputs of the lifecycle.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Version tag naming the generation this build owns.
    pub version: String,
    /// Absolute URLs fetched at install, in manifest order.
    pub precache: Vec<Url>,
    pub skip_waiting: bool,
    pub claim_clients: bool,
}

impl LifecycleConfig {
    /// Resolve the precache manifest of `config` against its origin.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let precache = config
            .precache
            .iter()
            .map(|path| canonicalize(path, &origin).map_err(|e| Error::InvalidUrl(format!("{path}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: config.cache_version.clone(),
            precache,
            skip_waiting: config.skip_waiting,
            claim_clients: config.claim_clients,
        })
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub precached: usize,
    /// Whether the host should take control without waiting.
    pub skip_waiting: bool,
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub version: String,
    pub evicted: Vec<String>,
    /// Whether the host should claim already open contexts.
    pub claim_clients: bool,
}

/// Drives one cache generation from install to active.
pub struct LifecycleController {
    db: CacheDb,
    config: LifecycleConfig,
    state: RwLock<LifecycleState>,
}

impl LifecycleController {
    pub fn new(db: CacheDb, config: LifecycleConfig) -> Self {
        Self { db, config, state: RwLock::new(LifecycleState::Idle) }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// The current generation's store, once the controller is active.
    pub async fn current_store(&self) -> Option<CacheStore> {
        match self.state().await {
            LifecycleState::Active => Some(CacheStore::new(self.db.clone(), self.config.version.clone())),
            _ => None,
        }
    }

    /// Like [`current_store`](Self::current_store), as an error when inactive.
    pub async fn require_store(&self) -> Result<CacheStore, Error> {
        let state = self.state().await;
        self.current_store()
            .await
            .ok_or_else(|| Error::NotActive(state.to_string()))
    }

    async fn transition(&self, from: LifecycleState, to: LifecycleState, action: &'static str) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidTransition { action, state: state.to_string() });
        }
        *state = to;
        tracing::info!(version = %self.config.version, "lifecycle: {from} -> {to}");
        Ok(())
    }

    async fn set_state(&self, to: LifecycleState) {
        let mut state = self.state.write().await;
        tracing::info!(version = %self.config.version, "lifecycle: {} -> {to}", *state);
        *state = to;
    }

    /// Install the precache set into a generation tagged with the running version.
    ///
    /// # Errors
    ///
    /// `Error::InvalidTransition` unless the controller is idle, and
    /// `Error::InstallFailed` when a precache fetch fails. In the latter case
    /// the controller is idle again and nothing was written.
    pub async fn install(&self, network: &dyn Network) -> Result<InstallReport, Error> {
        self.transition(LifecycleState::Idle, LifecycleState::Installing, "install")
            .await?;

        match self.precache(network).await {
            Ok(precached) => {
                self.set_state(LifecycleState::Installed).await;
                Ok(InstallReport { version: self.config.version.clone(), precached, skip_waiting: self.config.skip_waiting })
            }
            Err(e) => {
                tracing::warn!(version = %self.config.version, error = %e, "install failed, will retry");
                self.set_state(LifecycleState::Idle).await;
                Err(e)
            }
        }
    }

    async fn precache(&self, network: &dyn Network) -> Result<usize, Error> {
        let mut entries = Vec::with_capacity(self.config.precache.len());

        for url in &self.config.precache {
            let request = Request::get(url.clone());
            let response = network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;

            if !response.is_success() {
                return Err(Error::InstallFailed { url: url.to_string(), reason: format!("status {}", response.status) });
            }

            entries.push(CacheEntry::new(&request, response)?);
        }

        let precached = entries.len();
        self.db.install_generation(&self.config.version, entries).await?;
        tracing::debug!(version = %self.config.version, precached, "precache committed");
        Ok(precached)
    }

    /// Evict every stale generation and start serving the current one.
    ///
    /// # Errors
    ///
    /// `Error::InvalidTransition` unless the controller is installed. If
    /// eviction fails the controller stays installed so activation can be
    /// retried.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.transition(LifecycleState::Installed, LifecycleState::Activating, "activate")
            .await?;

        match self.db.delete_generations_except(&self.config.version).await {
            Ok(evicted) => {
                if !evicted.is_empty() {
                    tracing::info!(version = %self.config.version, ?evicted, "evicted stale generations");
                }
                self.set_state(LifecycleState::Active).await;
                Ok(ActivateReport {
                    version: self.config.version.clone(),
                    evicted,
                    claim_clients: self.config.claim_clients,
                })
            }
            Err(e) => {
                tracing::warn!(version = %self.config.version, error = %e, "eviction failed");
                self.set_state(LifecycleState::Installed).await;
                Err(e)
            }
        }
    }

    /// Activate the generation of the running version already on disk.
    ///
    /// Returns `None`, leaving the controller idle, when there is none.
    ///
    /// # Errors
    ///
    /// `Error::InvalidTransition` unless the controller is idle.
    pub async fn resume(&self) -> Result<Option<ActivateReport>, Error> {
        if !self.db.generation_exists(&self.config.version).await? {
            return Ok(None);
        }

        self.transition(LifecycleState::Idle, LifecycleState::Installed, "resume")
            .await?;
        self.activate().await.map(Some)
    }

    /// Install, then activate right away.
    ///
    /// A process is the only controller of its database, so there is never
    /// a previous controller to wait for. When the install fails but the
    /// running version was installed by an earlier process, that generation
    /// is served instead and refreshed on a later successful install.
    pub async fn run(&self, network: &dyn Network) -> Result<ActivateReport, Error> {
        let installed = match self.install(network).await {
            Ok(report) => report,
            Err(e @ Error::InvalidTransition { .. }) => return Err(e),
            Err(e) => {
                return match self.resume().await? {
                    Some(report) => {
                        tracing::warn!(version = %report.version, error = %e, "install failed, serving installed generation");
                        Ok(report)
                    }
                    None => Err(e),
                };
            }
        };

        if !installed.skip_waiting {
            tracing::info!(version = %installed.version, "no previous controller holds the cache, activating");
        }
        self.activate().await
    }
}
