//! MCP tool implementations.
//!
//! This module contains all tools exposed by the swcache server.

pub mod cache;
pub mod intercept;
pub mod status;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::{CacheGetParams, get_impl, keys_impl};
pub use intercept::{InterceptParams, intercept_impl};
pub use status::status_impl;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::ResponseSnapshot;

use crate::error::ToolError;

/// A response snapshot as returned by the tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseOutput {
    /// HTTP status code.
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers in the order they were received.
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, absent for binary bodies.
    pub body: Option<String>,
    /// Body length in bytes.
    pub body_bytes: usize,
}

impl From<&ResponseSnapshot> for ResponseOutput {
    fn from(response: &ResponseSnapshot) -> Self {
        Self {
            status: response.status,
            content_type: response.header("content-type").map(str::to_string),
            headers: response.headers.clone(),
            body: String::from_utf8(response.body.clone()).ok(),
            body_bytes: response.body.len(),
        }
    }
}

/// Encode `output` as the pretty-printed JSON text of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Output(format!("failed to encode output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
