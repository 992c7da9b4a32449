//! JSON-RPC requester.
//!
//! Wraps a single call in the node's versioned envelope, posts it over HTTP
//! and unwraps the `result` member of the reply. Transport failures, non-200
//! statuses, malformed envelopes and non-zero embedded error codes all come
//! back as [`RpcError`]. There is no retry or caching at this layer.

use std::time::Duration;
use std::{env, time::Instant};

use anyhow::{Context, Result, anyhow};
use gecko_util::{block_on_future, http::parse_response_json_strict, redact_sensitive};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
use url::Url;

use crate::RpcError;

pub const JSON_RPC_VERSION: &str = "2.0";

/// Calls are strictly sequential, so a constant id is enough to satisfy the
/// envelope format.
const REQUEST_ID: u64 = 1;

/// Default base URL of a locally running node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9650";
/// Environment variable overriding the node base URL.
pub const RPC_URL_ENV: &str = "GECKO_RPC_URL";
/// Environment variable overriding the per-call HTTP timeout, in seconds.
pub const RPC_TIMEOUT_ENV: &str = "GECKO_RPC_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Named parameters of a JSON-RPC call.
pub type Params = Map<String, Value>;

/// Issues one JSON-RPC call and returns the decoded `result` member.
///
/// Bindings depend on this trait rather than on HTTP so the workflow runner
/// can be driven by a scripted requester in tests.
pub trait JsonRpcRequester: Send + Sync {
    fn make_rpc_request(&self, endpoint: &str, method: &str, params: Params) -> Result<Value, RpcError>;
}

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a Params,
    pub id: u64,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(method: &'a str, params: &'a Params) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION,
            method,
            params,
            id: REQUEST_ID,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Connection settings for [`HttpRpcRequester`].
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    pub base_url: String,
    /// Per-call HTTP timeout, independent of any workflow-level wait.
    pub request_timeout: Duration,
}

impl RequesterConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{host}:{port}"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Read `GECKO_RPC_URL` and `GECKO_RPC_TIMEOUT_SECS`, falling back to a
    /// local node with a 30 second call timeout.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var(RPC_URL_ENV).unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let request_timeout = match env::var(RPC_TIMEOUT_ENV) {
            Ok(raw) => {
                let seconds: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{RPC_TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'"))?;
                Duration::from_secs(seconds)
            }
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };
        Ok(Self { base_url, request_timeout })
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// HTTP implementation of [`JsonRpcRequester`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRpcRequester {
    base_url: String,
    http: Client,
}

impl HttpRpcRequester {
    pub fn new(config: RequesterConfig) -> Result<Self> {
        validate_base_url(&config.base_url)?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `endpoint`.
    ///
    /// Leading separators are stripped: a doubled `//` in the path makes some
    /// servers treat the POST as a GET.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

impl JsonRpcRequester for HttpRpcRequester {
    fn make_rpc_request(&self, endpoint: &str, method: &str, params: Params) -> Result<Value, RpcError> {
        let endpoint = endpoint.trim_start_matches('/');
        let request = JsonRpcRequest::new(method, &params);
        let body = serde_json::to_string(&request).map_err(|source| RpcError::Serialization {
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            source,
        })?;

        let url = self.endpoint_url(endpoint);
        trace!(url = %url, body = %redact_sensitive(&body), "making JSON-RPC request");
        let start = Instant::now();

        let http = self.http.clone();
        let request_url = url.clone();
        let outcome = block_on_future(async move {
            let response = http
                .post(request_url)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        })?;

        let (status, text) = outcome.map_err(|source| {
            warn!(url = %url, method, error = %source, "JSON-RPC transport failure");
            RpcError::Transport {
                url: url.clone(),
                method: method.to_string(),
                source,
            }
        })?;
        trace!(url = %url, status = %status, body = %redact_sensitive(&text), "received JSON-RPC response");
        debug!(
            endpoint,
            method,
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "JSON-RPC call completed"
        );

        if status != StatusCode::OK {
            return Err(RpcError::Status {
                url,
                method: method.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        decode_envelope(method, status, &text)
    }
}

/// Decode a 200 response body and extract its `result` member.
///
/// A non-zero embedded error code wins over any `result`; a body with
/// neither is a decode failure rather than an empty success.
pub fn decode_envelope(method: &str, status: StatusCode, text: &str) -> Result<Value, RpcError> {
    let response: JsonRpcResponse =
        parse_response_json_strict(text, Some(status)).map_err(|error| RpcError::decode(method, error.to_string()))?;

    if let Some(error) = response.error
        && error.code != 0
    {
        return Err(RpcError::Remote {
            method: method.to_string(),
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    response
        .result
        .ok_or_else(|| RpcError::decode(method, "response envelope has no `result` member"))
}

/// Validate that a base URL is acceptable for use by the requester.
///
/// Rules:
/// - scheme must be `http` or `https`
/// - a host must be present
/// - no path beyond `/`, since endpoints are appended to it
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid node RPC URL '{}': {}", base, e))?;

    if !matches!(parsed_base_url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "node RPC URL must use http or https; got '{}://'",
            parsed_base_url.scheme()
        ));
    }
    if parsed_base_url.host_str().is_none() {
        return Err(anyhow!("node RPC URL must include a host"));
    }
    if parsed_base_url.path().trim_matches('/') != "" {
        return Err(anyhow!(
            "node RPC URL must not carry a path; got '{}'",
            parsed_base_url.path()
        ));
    }
    Ok(())
}
