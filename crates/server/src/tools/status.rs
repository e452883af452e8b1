//! lifecycle_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::LifecycleController;
use swcache_core::Generation;

use super::json_result;

/// Output from the lifecycle_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleStatusOutput {
    /// One of "idle", "installing", "installed", "activating", "active".
    pub state: String,
    /// Version tag of the running build.
    pub version: String,
    /// Generations present in the database, oldest first.
    pub generations: Vec<Generation>,
}

/// Implementation of the lifecycle_status tool.
pub async fn status_impl(lifecycle: &LifecycleController) -> Result<CallToolResult, McpError> {
    let generations = lifecycle.db().list_generations().await?;
    let output = LifecycleStatusOutput {
        state: lifecycle.state().await.to_string(),
        version: lifecycle.version().to_string(),
        generations,
    };

    json_result(&output)
}
