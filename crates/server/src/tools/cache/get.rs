//! cache_get tool implementation.
//!
//! Retrieves the snapshot stored for `GET url` in the current generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{LifecycleController, canonicalize};
use swcache_core::{Error, Request};
use url::Url;

use crate::tools::{ResponseOutput, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached response. Relative URLs resolve against the origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub url: String,
    pub key_hash: String,
    /// RFC 3339 timestamp of the last write.
    pub stored_at: String,
    pub response: ResponseOutput,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    lifecycle: &LifecycleController, origin: &Url, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let store = lifecycle.require_store().await?;

    let entry = store
        .entry(&Request::get(url.clone()))
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    let output = CacheGetOutput {
        generation: store.generation().to_string(),
        url: entry.url,
        key_hash: entry.key_hash,
        stored_at: entry.stored_at,
        response: ResponseOutput::from(&entry.response),
    };

    json_result(&output)
}
