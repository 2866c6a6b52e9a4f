//! Blocking façade over [`SessionClient`].
//!
//! Owns a current-thread tokio runtime; each method drives one async call to
//! completion on it. Calling these methods from inside another runtime panics,
//! so async code should use [`SessionClient`] directly.

use serde::Serialize;
use tokio::runtime::{Builder, Runtime};

use super::client::{SessionClient, SessionState, ToolCallOutcome};
use super::errors::SessionError;
use super::registry::ToolRegistry;
use super::transport::{HttpTransport, RawResponse, SignedRequest};
use super::types::{ToolArguments, ToolCallResult, ToolDescriptor, ToolInvocation};
use crate::auth::RequestAuth;
use crate::endpoint::EndpointDescriptor;

/// Synchronous session client. Every call blocks until its response arrives.
pub struct BlockingSessionClient<T> {
    inner: SessionClient<T>,
    runtime: Runtime,
}

impl<T: HttpTransport> BlockingSessionClient<T> {
    pub fn new(
        endpoint: EndpointDescriptor,
        auth: RequestAuth,
        transport: T,
    ) -> Result<Self, SessionError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SessionError::ConfigError {
                reason: format!("failed to start blocking runtime: {e}"),
            })?;
        Ok(Self {
            inner: SessionClient::new(endpoint, auth, transport),
            runtime,
        })
    }

    /// The wrapped async client.
    pub fn inner(&self) -> &SessionClient<T> {
        &self.inner
    }

    pub fn session_id(&self) -> Option<&str> {
        self.inner.session_id()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.inner.registry()
    }

    pub fn set_bearer_token(&mut self, token: impl Into<String>) -> Result<(), SessionError> {
        self.inner.set_bearer_token(token)
    }

    pub fn sign<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        extra_headers: &[(&str, &str)],
    ) -> Result<SignedRequest, SessionError> {
        self.runtime.block_on(self.inner.sign(payload, extra_headers))
    }

    pub fn post<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        extra_headers: &[(&str, &str)],
    ) -> Result<RawResponse, SessionError> {
        self.runtime.block_on(self.inner.post(payload, extra_headers))
    }

    pub fn create_session(&mut self) -> Result<(RawResponse, Option<String>), SessionError> {
        self.runtime.block_on(self.inner.create_session())
    }

    pub fn list_tools(&self) -> Result<RawResponse, SessionError> {
        self.runtime.block_on(self.inner.list_tools())
    }

    pub fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<RawResponse, SessionError> {
        self.runtime.block_on(self.inner.call_tool(name, arguments))
    }

    pub fn connect(&mut self) -> Result<Vec<ToolDescriptor>, SessionError> {
        self.runtime.block_on(self.inner.connect())
    }

    pub fn discover_tools(&mut self) -> Result<Vec<ToolDescriptor>, SessionError> {
        self.runtime.block_on(self.inner.discover_tools())
    }

    pub fn invoke_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, SessionError> {
        self.runtime.block_on(self.inner.invoke_tool(name, arguments))
    }

    pub fn invoke_batch(&self, calls: &[ToolInvocation]) -> Vec<ToolCallOutcome> {
        self.runtime.block_on(self.inner.invoke_batch(calls))
    }
}
