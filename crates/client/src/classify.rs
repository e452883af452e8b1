//! Request classification.
//!
//! Maps a request to the class that decides its caching strategy. Pure and
//! stateless: only the request's own metadata is consulted.

use serde::Serialize;
use std::fmt;
use swcache_core::{Destination, Request, RequestMode};

/// Resource class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    /// A full document load, served network-first.
    Navigation,
    /// Style, script, image or font, served cache-first.
    StaticAsset,
    /// Everything else, never intercepted.
    Other,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestClass::Navigation => "navigation",
            RequestClass::StaticAsset => "static-asset",
            RequestClass::Other => "other",
        };
        f.write_str(s)
    }
}

/// Classify a request.
///
/// Non-`GET` requests are always `Other`, whatever they target.
pub fn classify(request: &Request) -> RequestClass {
    if !request.is_get() {
        return RequestClass::Other;
    }

    if request.mode == RequestMode::Navigate || request.destination == Destination::Document {
        return RequestClass::Navigation;
    }

    match request.destination {
        Destination::Style | Destination::Script | Destination::Image | Destination::Font => RequestClass::StaticAsset,
        _ => RequestClass::Other,
    }
}
