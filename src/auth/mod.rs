//! Request authentication.
//!
//! Two schemes are supported, never mixed within one client:
//! - SigV4 request signing with credentials resolved per request
//! - `Authorization: Bearer` tokens, refreshed explicitly via [`token`]

pub mod credentials;
pub mod sigv4;
pub mod token;

use std::fmt;
use std::sync::Arc;

pub use credentials::{
    CredentialProvider, Credentials, SdkCredentialProvider, StaticCredentialProvider,
};
pub use sigv4::SigV4Signer;
pub use token::{check_token, refresh_if_needed, CognitoRefresher, TokenRefresher, TokenStatus};

/// Service name the agent runtime signs under.
pub const RUNTIME_SERVICE: &str = "bedrock-agentcore";

/// How a client authenticates its requests.
#[derive(Clone)]
pub enum RequestAuth {
    /// Sign every request; credentials are resolved again for each one.
    SigV4 {
        credentials: Arc<dyn CredentialProvider>,
        service: String,
    },
    /// Present a bearer token.
    Bearer { token: String },
}

impl RequestAuth {
    /// SigV4 for the agent runtime service.
    pub fn sigv4(credentials: Arc<dyn CredentialProvider>) -> Self {
        RequestAuth::SigV4 {
            credentials,
            service: RUNTIME_SERVICE.to_string(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        RequestAuth::Bearer {
            token: token.into(),
        }
    }

    /// Short scheme name for logs.
    pub fn scheme(&self) -> &'static str {
        match self {
            RequestAuth::SigV4 { .. } => "sigv4",
            RequestAuth::Bearer { .. } => "bearer",
        }
    }
}

impl fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestAuth::SigV4 {
                credentials,
                service,
            } => f
                .debug_struct("SigV4")
                .field("provider", &credentials.name())
                .field("service", service)
                .finish(),
            RequestAuth::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
