//! Errors raised by the tool layer itself.
//!
//! Cache and network failures arrive as `swcache_core::Error` and carry
//! their own MCP mapping.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the swcache tools.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool arguments that cannot form a request.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be encoded.
    #[error("OUTPUT_ERROR: {0}")]
    Output(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::Output(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
