//! Session client: MCP JSON-RPC over authenticated HTTP.
//!
//! This module handles:
//! - Building, authenticating and sending JSON-RPC payloads
//! - Session creation and `Mcp-Session-Id` propagation
//! - Tool discovery, argument validation and tool invocation
//! - A blocking facade for callers without an async runtime

pub mod blocking;
pub mod client;
pub mod errors;
pub mod registry;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use blocking::BlockingSessionClient;
pub use client::{SessionClient, SessionState, ToolCallOutcome};
pub use errors::SessionError;
pub use registry::ToolRegistry;
pub use transport::{HttpRequest, HttpTransport, RawResponse, ReqwestTransport, SignedRequest};
pub use types::{ToolArguments, ToolCallResult, ToolDescriptor, ToolInvocation};
