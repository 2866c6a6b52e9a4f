//! Signed session client for hosted agent runtime tool servers.
//!
//! Talks MCP (JSON-RPC 2.0) over HTTP POST to a runtime endpoint, signing
//! each request with SigV4 or presenting a bearer token, and carries the
//! server-issued session id across calls.

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod parameters;
pub mod session;

pub use auth::RequestAuth;
pub use config::{AuthMode, ClientConfig};
pub use endpoint::EndpointDescriptor;
pub use session::{BlockingSessionClient, SessionClient, SessionError};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "agentcore_session=info,warn";

/// Initialize the tracing subscriber on stderr, leaving stdout for results.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]. With `json` set, each event
/// is one JSON object per line. Calling this twice is a no-op.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), json, "tracing initialized");
}
