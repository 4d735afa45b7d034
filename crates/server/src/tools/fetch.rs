//! sw_fetch and sw_settle tool implementations.
//!
//! `sw_fetch` plays the page: it builds a request, lets the controller
//! intercept it and, for bypassed requests, performs the plain network fetch
//! the browser would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use safetrack_client::{CacheController, Intercept, Network, Source};
use safetrack_core::{Destination, Policy, Request, RequestMode, classify};

use super::json_result;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Path or absolute URL, resolved against the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<String>,

    /// Request destination such as "document", "script", "style" or "image".
    /// Navigations default to "document".
    #[serde(default)]
    pub destination: Option<String>,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub policy: Policy,
    /// False when the controller let the request through untouched.
    pub intercepted: bool,
    pub source: Source,
    /// Partition the response was read from, for cache sources.
    pub partition: Option<String>,
    pub status: u16,
    pub content_type: Option<String>,
    pub size: usize,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
}

/// Output from the sw_settle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SettleOutput {
    /// Background tasks joined.
    pub settled: usize,
}

fn build_request<N: Network + 'static>(
    controller: &CacheController<N>, params: &SwFetchParams,
) -> Result<Request, McpError> {
    let url = controller.resolve(&params.url)?;
    let mode: RequestMode = params.mode.as_deref().map(str::parse::<RequestMode>).transpose()?.unwrap_or_default();
    let destination = match (&params.destination, mode) {
        (Some(dest), _) => Destination::parse(dest),
        (None, RequestMode::Navigate) => Destination::Document,
        (None, _) => Destination::Empty,
    };

    let mut request = Request::get(url).with_method(params.method.as_deref().unwrap_or("GET"));
    request.mode = mode;
    request.destination = destination;
    Ok(request)
}

pub async fn fetch_impl<N: Network + 'static>(
    controller: &CacheController<N>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(controller, &params)?;
    let policy = classify(&request, &controller.config().scope);

    let (intercepted, response, source, partition) = match controller.handle_fetch(&request).await? {
        Intercept::Respond(served) => (true, served.response, served.source, served.partition),
        Intercept::Passthrough => (false, controller.network().fetch(&request).await?, Source::Network, None),
    };

    let output = SwFetchOutput {
        url: request.url.to_string(),
        policy,
        intercepted,
        source,
        partition,
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        size: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    };

    json_result(&output)
}

pub async fn settle_impl<N: Network + 'static>(controller: &CacheController<N>) -> Result<CallToolResult, McpError> {
    let settled = controller.settle().await;
    json_result(&SettleOutput { settled })
}
