//! Authenticated, session-scoped JSON-RPC calls.
//!
//! Owns one endpoint, one auth scheme, one transport and one session id.
//! There is no process-wide state: construct one client per logical session
//! and pass it to whatever needs to call tools.

use std::time::Instant;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;

use super::errors::SessionError;
use super::registry::ToolRegistry;
use super::transport::{extract_result, HttpRequest, HttpTransport, RawResponse, SignedRequest};
use super::types::{
    CallToolResult, JsonRpcRequest, ListToolsResult, ToolArguments, ToolCallResult,
    ToolDescriptor, ToolInvocation, SESSION_HEADER,
};
use crate::auth::{RequestAuth, SigV4Signer};
use crate::endpoint::EndpointDescriptor;

// ─── Constants ───────────────────────────────────────────────────────────────

const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// Status the runtime answers with once it has dropped a session.
const SESSION_GONE_STATUS: u16 = 404;

// ─── State ───────────────────────────────────────────────────────────────────

/// Client lifecycle. There is no way back from `SessionActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    SessionActive,
}

/// Outcome of one call in a batch.
#[derive(Debug)]
pub struct ToolCallOutcome {
    pub tool_name: String,
    pub outcome: Result<ToolCallResult, SessionError>,
}

// ─── SessionClient ───────────────────────────────────────────────────────────

/// Authenticated client for one remote tool server session.
pub struct SessionClient<T> {
    endpoint: EndpointDescriptor,
    url: String,
    auth: RequestAuth,
    transport: T,
    session_id: Option<String>,
    /// Tools advertised by the last successful `tools/list`.
    registry: ToolRegistry,
}

impl<T: HttpTransport> SessionClient<T> {
    /// Create a client. Does not touch the network.
    pub fn new(endpoint: EndpointDescriptor, auth: RequestAuth, transport: T) -> Self {
        let url = endpoint.url();
        Self {
            endpoint,
            url,
            auth,
            transport,
            session_id: None,
            registry: ToolRegistry::new(),
        }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn state(&self) -> SessionState {
        if self.session_id.is_some() {
            SessionState::SessionActive
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Swap in a refreshed bearer token. Only valid in bearer mode.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) -> Result<(), SessionError> {
        match &mut self.auth {
            RequestAuth::Bearer { token: current } => {
                *current = token.into();
                Ok(())
            }
            RequestAuth::SigV4 { .. } => Err(SessionError::ConfigError {
                reason: "client uses SigV4 signing, not bearer tokens".into(),
            }),
        }
    }

    // ─── Signing ─────────────────────────────────────────────────────────

    /// Build a ready-to-send request for `payload`, signed now.
    pub async fn sign<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        extra_headers: &[(&str, &str)],
    ) -> Result<SignedRequest, SessionError> {
        self.sign_at(payload, extra_headers, Utc::now()).await
    }

    /// Build a ready-to-send request for `payload`, signed at `time`.
    ///
    /// Headers start from `Content-Type` and `Accept`, then `extra_headers`
    /// are merged in, and only then is the request authenticated. SigV4
    /// credentials are resolved again on every call.
    pub async fn sign_at<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        extra_headers: &[(&str, &str)],
        time: DateTime<Utc>,
    ) -> Result<SignedRequest, SessionError> {
        let body = serde_json::to_vec(payload).map_err(|e| SessionError::ConfigError {
            reason: format!("failed to serialize payload: {e}"),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        for (name, value) in extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SessionError::ConfigError {
                    reason: format!("invalid header name '{name}': {e}"),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| SessionError::ConfigError {
                reason: format!("invalid value for header '{name}': {e}"),
            })?;
            headers.insert(name, value);
        }

        let mut request = HttpRequest {
            method: Method::POST,
            url: self.url.clone(),
            headers,
            body,
        };

        match &self.auth {
            RequestAuth::SigV4 {
                credentials,
                service,
            } => {
                let creds = credentials.resolve().await?;
                SigV4Signer::new(service.as_str(), self.endpoint.region.as_str())
                    .sign(&mut request, &creds, time)?;
            }
            RequestAuth::Bearer { token } => {
                let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                    SessionError::ConfigError {
                        reason: format!("invalid bearer token: {e}"),
                    }
                })?;
                request.headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(request)
    }

    /// Sign and send `payload`. One round trip, no retry.
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        extra_headers: &[(&str, &str)],
    ) -> Result<RawResponse, SessionError> {
        let request = self.sign(payload, extra_headers).await?;
        let started = Instant::now();
        let response = self.transport.send(request).await?;
        tracing::debug!(
            url = %self.url,
            status = response.status,
            request_id = response.request_id().unwrap_or("-"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "POST completed"
        );
        Ok(response)
    }

    // ─── Protocol Operations ─────────────────────────────────────────────

    /// Send `sessions/create`.
    ///
    /// The session id is accepted only from a 200 response carrying a
    /// non-empty `mcp-session-id` header; otherwise `None` is returned and
    /// the client stays uninitialized.
    pub async fn create_session(&mut self) -> Result<(RawResponse, Option<String>), SessionError> {
        tracing::info!(url = %self.url, auth = self.auth.scheme(), "creating MCP session");

        let response = self.post(&JsonRpcRequest::create_session(), &[]).await?;
        let session_id = if response.is_ok() {
            response.session_id().map(str::to_string)
        } else {
            None
        };

        match &session_id {
            Some(id) => {
                tracing::info!(session_id = %id, "MCP session established");
                self.session_id = Some(id.clone());
            }
            None => tracing::warn!(
                status = response.status,
                request_id = response.request_id().unwrap_or("-"),
                "session creation rejected"
            ),
        }

        Ok((response, session_id))
    }

    /// Send `tools/list` within the current session. Returns the raw response
    /// whatever its status; `discover_tools` decides what a failure means.
    pub async fn list_tools(&self) -> Result<RawResponse, SessionError> {
        let session_id = self.require_session()?;
        self.post(&JsonRpcRequest::list_tools(), &[(SESSION_HEADER, session_id)])
            .await
    }

    /// Send `tools/call` within the current session. Returns the raw response,
    /// except that a 404 becomes `SessionExpired`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<RawResponse, SessionError> {
        let session_id = self.require_session()?;
        let response = self
            .post(
                &JsonRpcRequest::call_tool(name, arguments),
                &[(SESSION_HEADER, session_id)],
            )
            .await?;
        check_session_alive(&response, session_id)?;
        Ok(response)
    }

    fn require_session(&self) -> Result<&str, SessionError> {
        self.session_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(SessionError::SessionNotEstablished)
    }

    // ─── High-level Operations ───────────────────────────────────────────

    /// Create a session and discover its tools. Any failure is fatal.
    pub async fn connect(&mut self) -> Result<Vec<ToolDescriptor>, SessionError> {
        let (response, session_id) = self.create_session().await?;
        if session_id.is_none() {
            return Err(SessionError::SessionCreationFailed {
                status: response.status,
                request_id: response.request_id().map(str::to_string),
                body: response.body,
            });
        }
        self.discover_tools().await
    }

    /// List tools, decode `result.tools`, and refresh the registry.
    pub async fn discover_tools(&mut self) -> Result<Vec<ToolDescriptor>, SessionError> {
        let response = self.list_tools().await?;

        let list_failed = |response: &RawResponse| SessionError::ToolListFailed {
            status: response.status,
            request_id: response.request_id().map(str::to_string),
            body: response.body.clone(),
        };

        if !response.is_ok() {
            return Err(list_failed(&response));
        }

        let value = response
            .json_rpc()
            .and_then(extract_result)
            .map_err(|_| list_failed(&response))?;
        let result: ListToolsResult =
            serde_json::from_value(value).map_err(|_| list_failed(&response))?;

        tracing::info!(
            tool_count = result.tools.len(),
            tools = ?result.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "discovered remote tools"
        );

        self.registry.replace_all(result.tools.clone());
        Ok(result.tools)
    }

    /// Invoke one tool and extract its primary text result.
    ///
    /// Steps:
    /// 1. Validate arguments against the discovered schema (if any)
    /// 2. Send `tools/call`
    /// 3. Map transport, HTTP and JSON-RPC failures to `ToolCallFailed`
    /// 4. Return `result.content[0].text`; `isError` results come back with
    ///    `success: false`
    pub async fn invoke_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, SessionError> {
        let start = Instant::now();

        // 1. Validate
        if !self.registry.is_empty() {
            self.registry.validate_tool_call(name, arguments)?;
        }

        let call_failed = |reason: String| SessionError::ToolCallFailed {
            tool: name.to_string(),
            reason,
        };

        // 2. Send
        let response = self.call_tool(name, arguments).await.map_err(|e| match e {
            SessionError::SessionExpired { .. } | SessionError::SessionNotEstablished => e,
            other => call_failed(other.to_string()),
        })?;

        let elapsed = start.elapsed().as_millis() as u64;

        // 3. Check
        if !response.is_ok() {
            return Err(call_failed(format!(
                "HTTP {} (request id: {}): {}",
                response.status,
                response.request_id().unwrap_or("-"),
                response.body
            )));
        }
        let message = response.json_rpc().map_err(|e| call_failed(e.to_string()))?;
        if let Some(err) = message.error {
            return Err(call_failed(format!("[{}] {}", err.code, err.message)));
        }
        let value = message
            .result
            .ok_or_else(|| call_failed("response missing both result and error".into()))?;

        // 4. Extract
        let parsed: Option<CallToolResult> = serde_json::from_value(value.clone()).ok();
        let text = parsed
            .as_ref()
            .and_then(|r| r.primary_text())
            .map(str::to_string);
        let is_error = parsed.as_ref().map(|r| r.is_error).unwrap_or(false);

        tracing::info!(tool = name, elapsed_ms = elapsed, is_error, "tool call completed");

        Ok(ToolCallResult {
            tool_name: name.to_string(),
            success: !is_error,
            error: if is_error { text.clone() } else { None },
            text,
            result: Some(value),
            execution_time_ms: elapsed,
        })
    }

    /// Invoke each call in order. A failure never stops the remaining calls.
    pub async fn invoke_batch(&self, calls: &[ToolInvocation]) -> Vec<ToolCallOutcome> {
        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            let outcome = self.invoke_tool(&call.name, &call.arguments).await;
            match &outcome {
                Err(e) if e.is_fatal() => {
                    tracing::error!(tool = %call.name, error = %e, "tool call failed at session level")
                }
                Err(e) => tracing::warn!(tool = %call.name, error = %e, "tool call failed"),
                Ok(_) => {}
            }
            outcomes.push(ToolCallOutcome {
                tool_name: call.name.clone(),
                outcome,
            });
        }
        outcomes
    }
}

/// A 404 on a tool call means the server dropped the session.
fn check_session_alive(response: &RawResponse, session_id: &str) -> Result<(), SessionError> {
    if response.status == SESSION_GONE_STATUS {
        tracing::warn!(session_id, "server no longer recognises session");
        return Err(SessionError::SessionExpired {
            session_id: session_id.to_string(),
        });
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;
    use crate::auth::{CredentialProvider, Credentials, StaticCredentialProvider};
    use crate::session::transport::testing::{response, ScriptedTransport};
    use crate::session::types::PROTOCOL_VERSION;

    const ARN: &str = "arn:aws:bedrock-agentcore:us-west-2:111122223333:runtime/my-runtime";

    struct NoCredentials;

    #[async_trait::async_trait]
    impl CredentialProvider for NoCredentials {
        fn name(&self) -> &'static str {
            "none"
        }
        async fn resolve(&self) -> Result<Credentials, SessionError> {
            Err(SessionError::CredentialsUnavailable {
                reason: "no ambient credentials".into(),
            })
        }
    }

    fn sigv4_auth() -> RequestAuth {
        RequestAuth::sigv4(Arc::new(StaticCredentialProvider::new(Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            Some("session-token".into()),
        ))))
    }

    fn client(transport: &ScriptedTransport) -> SessionClient<ScriptedTransport> {
        SessionClient::new(
            EndpointDescriptor::new("us-west-2", ARN),
            sigv4_auth(),
            transport.clone(),
        )
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    fn body_json(request: &HttpRequest) -> Value {
        serde_json::from_slice(&request.body).unwrap()
    }

    const TOOLS_BODY: &str = r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"add_numbers","description":"adds two numbers","inputSchema":{"type":"object","properties":{"a":{"type":"integer"},"b":{"type":"integer"}},"required":["a","b"]}}]}}"#;

    async fn active_client(transport: &ScriptedTransport, session: &str) -> SessionClient<ScriptedTransport> {
        transport.push(response(200, &[("mcp-session-id", session)], "{}"));
        let mut client = client(transport);
        let (_, id) = client.create_session().await.unwrap();
        assert_eq!(id.as_deref(), Some(session));
        client
    }

    // ─── sign ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_sign_produces_signature_and_base_headers() {
        let transport = ScriptedTransport::new();
        let signed = client(&transport)
            .sign(&JsonRpcRequest::list_tools(), &[(SESSION_HEADER, "s1")])
            .await
            .unwrap();

        assert_eq!(signed.method, Method::POST);
        assert_eq!(signed.header("content-type"), Some("application/json"));
        assert_eq!(signed.header("accept"), Some(ACCEPT_VALUE));
        assert_eq!(signed.header("mcp-session-id"), Some("s1"));
        let auth = signed.header("authorization").unwrap();
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[tokio::test]
    async fn test_sign_is_deterministic_for_fixed_time() {
        let transport = ScriptedTransport::new();
        let client = client(&transport);
        let time = Utc.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap();
        let payload = JsonRpcRequest::create_session();
        let first = client.sign_at(&payload, &[], time).await.unwrap();
        let second = client.sign_at(&payload, &[], time).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sign_create_session_matches_reference_signature() {
        let transport = ScriptedTransport::new();
        let time = Utc.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap();
        let signed = client(&transport)
            .sign_at(&JsonRpcRequest::create_session(), &[], time)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(signed.body.clone()).unwrap(),
            format!(
                r#"{{"jsonrpc":"2.0","id":1,"method":"sessions/create","params":{{"protocolVersion":"{PROTOCOL_VERSION}"}}}}"#
            )
        );
        assert!(signed
            .header("authorization")
            .unwrap()
            .ends_with("Signature=206ef5c89f354e07676468582cd12814e3c9efa17a66618e18c6597b3fa1dd26"));
    }

    #[tokio::test]
    async fn test_sign_without_credentials_fails() {
        let transport = ScriptedTransport::new();
        let client = SessionClient::new(
            EndpointDescriptor::new("us-west-2", ARN),
            RequestAuth::sigv4(Arc::new(NoCredentials)),
            transport,
        );
        let err = client.sign(&JsonRpcRequest::list_tools(), &[]).await.unwrap_err();
        assert!(matches!(err, SessionError::CredentialsUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_bearer_mode_sets_authorization() {
        let transport = ScriptedTransport::new();
        let mut client = SessionClient::new(
            EndpointDescriptor::new("us-west-2", ARN),
            RequestAuth::bearer("tok-1"),
            transport,
        );
        let signed = client.sign(&JsonRpcRequest::list_tools(), &[]).await.unwrap();
        assert_eq!(signed.header("authorization"), Some("Bearer tok-1"));
        assert!(signed.header("x-amz-date").is_none());

        client.set_bearer_token("tok-2").unwrap();
        let signed = client.sign(&JsonRpcRequest::list_tools(), &[]).await.unwrap();
        assert_eq!(signed.header("authorization"), Some("Bearer tok-2"));
    }

    #[test]
    fn test_set_bearer_token_rejected_in_sigv4_mode() {
        let transport = ScriptedTransport::new();
        let mut client = client(&transport);
        assert!(matches!(
            client.set_bearer_token("tok"),
            Err(SessionError::ConfigError { .. })
        ));
    }

    // ─── create_session ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_session_non_200_ignores_header() {
        let transport = ScriptedTransport::new();
        transport.push(response(500, &[("mcp-session-id", "s1")], "oops"));
        let mut client = client(&transport);

        let (resp, id) = client.create_session().await.unwrap();
        assert_eq!(resp.status, 500);
        assert!(id.is_none());
        assert_eq!(client.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_create_session_missing_header() {
        let transport = ScriptedTransport::new();
        transport.push(response(200, &[], "{}"));
        let mut client = client(&transport);
        let (_, id) = client.create_session().await.unwrap();
        assert!(id.is_none());
        assert!(client.session_id().is_none());
    }

    #[tokio::test]
    async fn test_create_session_sends_fixed_payload() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        assert_eq!(client.state(), SessionState::SessionActive);

        let sent = transport.sent();
        let body = body_json(&sent[0]);
        assert_eq!(body["method"], "sessions/create");
        assert_eq!(body["id"], 1);
        assert_eq!(body["params"]["protocolVersion"], "2025-06-18");
        assert!(sent[0].header("mcp-session-id").is_none());
    }

    #[tokio::test]
    async fn test_failed_recreate_keeps_active_session() {
        let transport = ScriptedTransport::new();
        let mut client = active_client(&transport, "s1").await;
        transport.push(response(503, &[], ""));
        let (_, id) = client.create_session().await.unwrap();
        assert!(id.is_none());
        assert_eq!(client.session_id(), Some("s1"));
    }

    // ─── session header round trip ───────────────────────────────────────

    #[tokio::test]
    async fn test_session_id_attached_to_list_and_call() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "sess-abc123").await;
        transport.push(response(200, &[], TOOLS_BODY));
        transport.push(response(200, &[], r#"{"result":{"content":[{"text":"8"}]}}"#));

        client.list_tools().await.unwrap();
        client
            .call_tool("add_numbers", &args(json!({"a": 5, "b": 3})))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        for request in &sent[1..] {
            assert_eq!(request.header("Mcp-Session-Id"), Some("sess-abc123"));
            assert!(request
                .header("authorization")
                .unwrap()
                .contains("mcp-session-id"));
        }
        assert_eq!(body_json(&sent[1])["method"], "tools/list");
        assert_eq!(body_json(&sent[1])["id"], 2);
        assert_eq!(body_json(&sent[2])["method"], "tools/call");
        assert_eq!(body_json(&sent[2])["id"], 3);
    }

    #[tokio::test]
    async fn test_calls_before_session_never_hit_the_wire() {
        let transport = ScriptedTransport::new();
        let client = client(&transport);

        assert!(matches!(
            client.list_tools().await,
            Err(SessionError::SessionNotEstablished)
        ));
        assert!(matches!(
            client.call_tool("add_numbers", &ToolArguments::new()).await,
            Err(SessionError::SessionNotEstablished)
        ));
        assert!(transport.sent().is_empty());
    }

    // ─── end to end ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_discovers_single_tool() {
        let transport = ScriptedTransport::new();
        transport.push(response(200, &[("mcp-session-id", "s1")], "{}"));
        transport.push(response(
            200,
            &[],
            r#"{"result":{"tools":[{"name":"add_numbers","description":"adds two numbers"}]}}"#,
        ));
        let mut client = client(&transport);

        let tools = client.connect().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "add_numbers");
        assert_eq!(tools[0].description, "adds two numbers");
        assert_eq!(client.registry().len(), 1);
        assert_eq!(transport.sent()[1].header("mcp-session-id"), Some("s1"));
    }

    #[tokio::test]
    async fn test_invoke_tool_extracts_text() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(200, &[], r#"{"result":{"content":[{"text":"8"}]}}"#));

        let result = client
            .invoke_tool("add_numbers", &args(json!({"a": 5, "b": 3})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.text.as_deref(), Some("8"));
        assert_eq!(result.tool_name, "add_numbers");

        let call = body_json(&transport.sent()[1]);
        assert_eq!(call["params"]["name"], "add_numbers");
        assert_eq!(call["params"]["arguments"], json!({"a": 5, "b": 3}));
    }

    #[tokio::test]
    async fn test_invoke_tool_accepts_sse_body() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(
            200,
            &[("content-type", "text/event-stream")],
            "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"Hello, Alice!\"}]}}\n\n",
        ));
        let result = client
            .invoke_tool("greet_user", &args(json!({"name": "Alice"})))
            .await
            .unwrap();
        assert_eq!(result.text.as_deref(), Some("Hello, Alice!"));
    }

    #[tokio::test]
    async fn test_invoke_tool_rpc_error_is_call_failure() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(
            200,
            &[],
            r#"{"id":3,"error":{"code":-32602,"message":"Unknown tool: nope"}}"#,
        ));
        let err = client
            .invoke_tool("nope", &ToolArguments::new())
            .await
            .unwrap_err();
        match err {
            SessionError::ToolCallFailed { tool, reason } => {
                assert_eq!(tool, "nope");
                assert!(reason.contains("-32602"));
            }
            other => panic!("expected ToolCallFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_tool_is_error_result() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(
            200,
            &[],
            r#"{"result":{"content":[{"type":"text","text":"division by zero"}],"isError":true}}"#,
        ));
        let result = client
            .invoke_tool("divide", &ToolArguments::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("division by zero"));
    }

    #[tokio::test]
    async fn test_expired_session_is_distinct() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(404, &[], "session not found"));
        let err = client
            .invoke_tool("add_numbers", &args(json!({"a": 1, "b": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionExpired { ref session_id } if session_id == "s1"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected_locally() {
        let transport = ScriptedTransport::new();
        let mut client = active_client(&transport, "s1").await;
        transport.push(response(200, &[], TOOLS_BODY));
        client.discover_tools().await.unwrap();

        let err = client
            .invoke_tool("add_numbers", &args(json!({"a": 5})))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidArguments { .. }));
        let err = client
            .invoke_tool("subtract_numbers", &ToolArguments::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownTool { .. }));
        // create + list only
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_connect_rejected_session_is_fatal() {
        let transport = ScriptedTransport::new();
        transport.push(response(
            403,
            &[("x-amzn-requestid", "req-42")],
            r#"{"message":"Access denied"}"#,
        ));
        let mut client = client(&transport);
        match client.connect().await.unwrap_err() {
            SessionError::SessionCreationFailed {
                status,
                request_id,
                body,
            } => {
                assert_eq!(status, 403);
                assert_eq!(request_id.as_deref(), Some("req-42"));
                assert!(body.contains("Access denied"));
            }
            other => panic!("expected SessionCreationFailed, got {other:?}"),
        }
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_discover_tools_non_200_is_fatal() {
        let transport = ScriptedTransport::new();
        let mut client = active_client(&transport, "s1").await;
        transport.push(response(500, &[], "internal"));
        assert!(matches!(
            client.discover_tools().await,
            Err(SessionError::ToolListFailed { status: 500, .. })
        ));
        assert!(client.registry().is_empty());
    }

    #[tokio::test]
    async fn test_connect_list_404_is_tool_list_failure() {
        let transport = ScriptedTransport::new();
        transport.push(response(200, &[("mcp-session-id", "s1")], "{}"));
        transport.push(response(404, &[("x-amzn-requestid", "req-9")], "not found"));
        let mut client = client(&transport);

        match client.connect().await.unwrap_err() {
            SessionError::ToolListFailed {
                status,
                request_id,
                body,
            } => {
                assert_eq!(status, 404);
                assert_eq!(request_id.as_deref(), Some("req-9"));
                assert_eq!(body, "not found");
            }
            other => panic!("expected ToolListFailed, got {other:?}"),
        }
        assert_eq!(client.session_id(), Some("s1"));
    }

    #[tokio::test]
    async fn test_list_tools_returns_404_response() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(404, &[], ""));
        assert_eq!(client.list_tools().await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_call_tool_404_is_session_expired() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(404, &[], ""));
        assert!(matches!(
            client.call_tool("add_numbers", &ToolArguments::new()).await,
            Err(SessionError::SessionExpired { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let transport = ScriptedTransport::new();
        let client = active_client(&transport, "s1").await;
        transport.push(response(200, &[], r#"{"result":{"content":[{"text":"8"}]}}"#));
        transport.push_error("connection reset by peer");
        transport.push(response(
            200,
            &[],
            r#"{"result":{"content":[{"text":"Hello, Alice!"}]}}"#,
        ));

        let calls = vec![
            ToolInvocation::new("add_numbers", json!({"a": 5, "b": 3})).unwrap(),
            ToolInvocation::new("multiply_numbers", json!({"a": 4, "b": 7})).unwrap(),
            ToolInvocation::new("greet_user", json!({"name": "Alice"})).unwrap(),
        ];
        let outcomes = client.invoke_batch(&calls).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0].outcome.as_ref().unwrap().text.as_deref(),
            Some("8")
        );
        assert!(matches!(
            outcomes[1].outcome,
            Err(SessionError::ToolCallFailed { ref tool, .. }) if tool == "multiply_numbers"
        ));
        assert_eq!(
            outcomes[2].outcome.as_ref().unwrap().text.as_deref(),
            Some("Hello, Alice!")
        );
        // create + three calls
        assert_eq!(transport.sent().len(), 4);
    }
}
