//! Request and response types passed through the interception boundary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The kind of resource a request is fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    Audio,
    Video,
    Worker,
    Empty,
}

impl Destination {
    /// Infer a destination from the extension of a URL path.
    ///
    /// Paths without an extension are treated as documents.
    pub fn from_path(path: &str) -> Self {
        let file = path.rsplit('/').next().unwrap_or("");
        let Some((_, ext)) = file.rsplit_once('.') else {
            return Destination::Document;
        };

        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => Destination::Document,
            "css" => Destination::Style,
            "js" | "mjs" => Destination::Script,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => Destination::Image,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Destination::Font,
            "webmanifest" => Destination::Manifest,
            "mp3" | "ogg" | "wav" => Destination::Audio,
            "mp4" | "webm" => Destination::Video,
            _ => Destination::Empty,
        }
    }
}

/// Request mode as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An intercepted outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
    pub destination: Destination,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Build a request; the method is uppercased and the URL fragment dropped.
    pub fn new(method: &str, mut url: Url) -> Self {
        url.set_fragment(None);
        Self {
            method: method.trim().to_ascii_uppercase(),
            url,
            destination: Destination::Empty,
            mode: RequestMode::default(),
            headers: Vec::new(),
        }
    }

    /// A plain `GET` with no destination, as issued during precaching.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// A top-level page load.
    pub fn navigate(url: Url) -> Self {
        Self { destination: Destination::Document, mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// Immutable snapshot of a response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// A locally generated plain-text response.
    pub fn synthesized(status: u16, text: &str) -> Self {
        Self::new(
            status,
            vec![("content-type".to_string(), "text/plain; charset=utf-8".to_string())],
            text.as_bytes(),
        )
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    Synthesized,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::OfflineFallback => "offline-fallback",
            ResponseSource::Synthesized => "synthesized",
        };
        f.write_str(s)
    }
}

/// A response handed back to the host together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: ResponseSnapshot, source: ResponseSource) -> Self {
        Self { response, source }
    }
}
