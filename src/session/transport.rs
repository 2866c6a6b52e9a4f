//! JSON-RPC over HTTP POST transport.
//!
//! Handles the low-level exchange with the remote tool server:
//! - Sending a fully prepared (signed) request and capturing the raw response
//! - Decoding the body, which may be plain JSON or SSE-framed
//!   (`event: message` / `data: {...}`) because we accept `text/event-stream`
//! - Converting JSON-RPC `error` objects into `SessionError`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method};

use super::errors::SessionError;
use super::types::{JsonRpcResponse, REQUEST_ID_HEADER, SESSION_HEADER};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default total request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─── Request / Response ──────────────────────────────────────────────────────

/// An outbound HTTP request whose headers and body are final.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// A request carrying its authentication headers. Single use: the signature
/// embeds the signing time.
pub type SignedRequest = HttpRequest;

impl HttpRequest {
    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The raw HTTP response: status, headers and body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Header value as a string (case-insensitive lookup).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request id echoed by the runtime, for diagnostics.
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    /// Non-empty session id from the `mcp-session-id` header.
    pub fn session_id(&self) -> Option<&str> {
        self.header(SESSION_HEADER).filter(|s| !s.is_empty())
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decode the body as a JSON-RPC response.
    pub fn json_rpc(&self) -> Result<JsonRpcResponse, SessionError> {
        decode_body(&self.body)
    }
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// Sends prepared requests. One network round trip per call, no retries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, SessionError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    /// Build a transport with the default request timeout.
    pub fn new() -> Result<Self, SessionError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a transport with an explicit total request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, SessionError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, SessionError> {
        let url = request.url.clone();

        let response = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_connect() {
                    format!("connection failed: {e}")
                } else if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                };
                SessionError::Transport {
                    url: url.clone(),
                    reason,
                }
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| SessionError::Transport {
            url: url.clone(),
            reason: format!("failed to read response body: {e}"),
        })?;

        tracing::debug!(url = %url, status, bytes = body.len(), "response received");

        Ok(RawResponse::new(status, headers, body))
    }
}

// ─── Body Decoding ───────────────────────────────────────────────────────────

/// Decode a response body into a JSON-RPC message.
///
/// Plain JSON bodies are parsed directly. SSE bodies are split into events
/// and the last `data:` payload that parses wins; intermediate events are
/// progress notifications.
pub fn decode_body(body: &str) -> Result<JsonRpcResponse, SessionError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidResponse {
            reason: "empty response body".into(),
        });
    }

    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).map_err(|e| SessionError::InvalidResponse {
            reason: format!("malformed JSON-RPC body: {e}"),
        });
    }

    let mut last: Option<JsonRpcResponse> = None;
    for event in trimmed.replace("\r\n", "\n").split("\n\n") {
        let mut data = String::new();
        for line in event.lines() {
            if let Some(payload) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) {
                data.push_str(payload.trim());
            }
        }
        if data.is_empty() {
            continue;
        }
        if let Ok(message) = serde_json::from_str::<JsonRpcResponse>(&data) {
            last = Some(message);
        }
    }

    last.ok_or_else(|| SessionError::InvalidResponse {
        reason: "no JSON-RPC message in event stream".into(),
    })
}

// ─── Response Helpers ────────────────────────────────────────────────────────

/// Extract the result from a JSON-RPC response, converting errors to `SessionError`.
pub fn extract_result(response: JsonRpcResponse) -> Result<serde_json::Value, SessionError> {
    if let Some(err) = response.error {
        return Err(SessionError::InvalidResponse {
            reason: format!("[{}] {}", err.code, err.message),
        });
    }

    response.result.ok_or(SessionError::InvalidResponse {
        reason: "response missing both result and error".into(),
    })
}

// ─── Test Transport ──────────────────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
