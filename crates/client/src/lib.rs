//! Client side of swcache.
//!
//! This crate provides the network fetch pipeline, request classification,
//! caching strategies, the offline fallback chain and the generation
//! lifecycle, tied together by the [`Interceptor`].

pub mod classify;
pub mod fallback;
pub mod fetch;
pub mod intercept;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
mod test_support;

pub use classify::{RequestClass, classify};
pub use fallback::{FallbackResolver, NOT_FOUND_BODY, OFFLINE_BODY};
pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize};
pub use intercept::{Interception, Interceptor};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleConfig, LifecycleController, LifecycleState};
pub use strategy::{Dispatcher, WriteBacks};
