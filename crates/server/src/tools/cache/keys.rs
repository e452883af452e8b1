//! cache_keys tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::LifecycleController;

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub generation: String,
    /// Cached URLs, sorted.
    pub urls: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(lifecycle: &LifecycleController) -> Result<CallToolResult, McpError> {
    let store = lifecycle.require_store().await?;
    let urls = store.keys().await?;

    json_result(&CacheKeysOutput { generation: store.generation().to_string(), urls })
}
