//! Session client error types.

use thiserror::Error;

/// Errors that can occur while talking to a remote tool server.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No credentials could be resolved from any configured provider.
    #[error("credentials unavailable: {reason}")]
    CredentialsUnavailable {
        reason: String,
    },

    /// `sessions/create` returned a non-200 status or no session id header.
    #[error("session creation failed with HTTP {status} (request id: {}): {body}", request_id.as_deref().unwrap_or("-"))]
    SessionCreationFailed {
        status: u16,
        request_id: Option<String>,
        body: String,
    },

    /// `tools/list` returned a non-200 status or an unreadable tool list.
    #[error("tool listing failed with HTTP {status} (request id: {}): {body}", request_id.as_deref().unwrap_or("-"))]
    ToolListFailed {
        status: u16,
        request_id: Option<String>,
        body: String,
    },

    /// A single tool invocation failed at the transport or protocol level.
    #[error("tool call '{tool}' failed: {reason}")]
    ToolCallFailed {
        tool: String,
        reason: String,
    },

    /// The remote service no longer recognises the session id.
    #[error("session '{session_id}' has expired on the server")]
    SessionExpired {
        session_id: String,
    },

    /// A session-scoped request was attempted before `sessions/create` succeeded.
    #[error("no active session: call create_session first")]
    SessionNotEstablished,

    /// The refresh-token exchange with the identity provider failed.
    #[error("token refresh failed: {reason}")]
    TokenRefreshFailed {
        reason: String,
    },

    /// HTTP-level failure (connect, timeout, body read).
    #[error("transport error for {url}: {reason}")]
    Transport {
        url: String,
        reason: String,
    },

    /// The response body was not the JSON-RPC message we expected.
    #[error("invalid response: {reason}")]
    InvalidResponse {
        reason: String,
    },

    /// Tool not present in the discovered registry.
    #[error("unknown tool: '{name}'")]
    UnknownTool {
        name: String,
    },

    /// Tool call arguments failed schema validation.
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments {
        tool: String,
        reason: String,
    },

    /// A parameter or secret lookup failed.
    #[error("lookup of '{name}' failed: {reason}")]
    ParameterLookupFailed {
        name: String,
        reason: String,
    },

    /// Configuration error (missing region, unreadable config file).
    #[error("config error: {reason}")]
    ConfigError {
        reason: String,
    },
}

impl SessionError {
    /// Whether the error ends the run when it happens during bootstrap.
    ///
    /// Per-call failures are reported and the batch continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SessionError::ToolCallFailed { .. }
                | SessionError::UnknownTool { .. }
                | SessionError::InvalidArguments { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation_failed_display_includes_request_id() {
        let err = SessionError::SessionCreationFailed {
            status: 403,
            request_id: Some("req-1".into()),
            body: "denied".into(),
        };
        let text = err.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("req-1"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_missing_request_id_renders_dash() {
        let err = SessionError::ToolListFailed {
            status: 500,
            request_id: None,
            body: String::new(),
        };
        assert!(err.to_string().contains("request id: -"));
    }

    #[test]
    fn test_tool_call_failures_are_not_fatal() {
        let err = SessionError::ToolCallFailed {
            tool: "add_numbers".into(),
            reason: "boom".into(),
        };
        assert!(!err.is_fatal());
        assert!(SessionError::SessionNotEstablished.is_fatal());
        assert!(SessionError::SessionExpired {
            session_id: "s1".into()
        }
        .is_fatal());
    }
}
