//! intercept tool implementation.
//!
//! Runs one request through the interceptor, the way a page of the host
//! would issue it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{
    Interception, Interceptor, LifecycleController, LifecycleState, Network, RequestClass, canonicalize, classify,
};
use swcache_core::{Destination, Error, Request, RequestMode, ResponseSource};
use url::Url;

use super::{ResponseOutput, json_result};
use crate::error::ToolError;

/// Input parameters for the intercept tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InterceptParams {
    /// URL to request. Relative URLs resolve against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination. Inferred from the path extension when omitted.
    #[serde(default)]
    pub destination: Option<Destination>,

    /// Request mode. Defaults to "navigate" for documents, "cors" otherwise.
    #[serde(default)]
    pub mode: Option<RequestMode>,

    /// Extra request headers, sent to the network as given.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the intercept tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InterceptOutput {
    pub url: String,
    pub method: String,
    /// "navigation", "static-asset" or "other".
    pub class: String,
    /// Whether the interceptor answered. Passthrough requests go to the
    /// network uncached.
    pub intercepted: bool,
    /// Where the response came from, absent for passthrough.
    pub source: Option<ResponseSource>,
    pub response: ResponseOutput,
}

/// Build the request described by `params`.
pub(crate) fn build_request(origin: &Url, params: &InterceptParams) -> Result<Request, McpError> {
    let method = params.method.trim();
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ToolError::InvalidInput(format!("unsupported method: {:?}", params.method)).into());
    }

    let url = canonicalize(&params.url, origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let destination = params
        .destination
        .unwrap_or_else(|| Destination::from_path(url.path()));
    let mode = params.mode.unwrap_or(match destination {
        Destination::Document => RequestMode::Navigate,
        _ => RequestMode::default(),
    });

    let request = Request::new(method, url)
        .with_destination(destination)
        .with_mode(mode);

    Ok(params
        .headers
        .iter()
        .fold(request, |request, (name, value)| request.with_header(name.as_str(), value.as_str())))
}

/// Bring the lifecycle to `active` if an earlier attempt stopped short.
///
/// Failures are logged; requests keep passing through until a later
/// navigation succeeds.
pub(crate) async fn ensure_active(lifecycle: &LifecycleController, network: &dyn Network) {
    let result = match lifecycle.state().await {
        LifecycleState::Idle => lifecycle.run(network).await,
        LifecycleState::Installed => lifecycle.activate().await,
        _ => return,
    };

    match result {
        Ok(report) => tracing::info!(version = %report.version, evicted = report.evicted.len(), "cache activated"),
        Err(e @ Error::InvalidTransition { .. }) => tracing::debug!("concurrent activation: {e}"),
        Err(e) => tracing::warn!(version = lifecycle.version(), error = %e, "cache still inactive"),
    }
}

/// Implementation of the intercept tool.
pub async fn intercept_impl(
    interceptor: &Interceptor, origin: &Url, params: InterceptParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(origin, &params)?;
    let class = classify(&request);
    if class == RequestClass::Navigation {
        ensure_active(interceptor.lifecycle(), interceptor.network().as_ref()).await;
    }

    let (source, response) = match interceptor.intercept(&request).await {
        Interception::Respond(served) => (Some(served.source), served.response),
        Interception::Passthrough => (None, interceptor.network().fetch(&request).await?),
    };

    let output = InterceptOutput {
        url: request.url().to_string(),
        method: request.method().to_string(),
        class: class.to_string(),
        intercepted: source.is_some(),
        source,
        response: ResponseOutput::from(&response),
    };

    json_result(&output)
}
