//! Ambient credential resolution.
//!
//! Credentials are short-lived and may rotate, so providers are asked again
//! for every signed request; nothing here caches a resolved value.

use std::fmt;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};

use crate::session::SessionError;

/// An access key / secret key / optional session token triple.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A source of credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Resolve the current credentials.
    async fn resolve(&self) -> Result<Credentials, SessionError>;
}

// ─── SDK default chain ───────────────────────────────────────────────────────

/// Credentials from an `aws-config` provider, normally the default chain
/// (environment, shared files with `credential_process`/SSO/assume-role,
/// web identity, container and instance roles).
#[derive(Debug, Clone)]
pub struct SdkCredentialProvider {
    inner: SharedCredentialsProvider,
}

impl SdkCredentialProvider {
    pub fn new(provider: impl ProvideCredentials + 'static) -> Self {
        Self {
            inner: SharedCredentialsProvider::new(provider),
        }
    }

    /// The provider configured on a loaded `SdkConfig`.
    pub fn from_sdk_config(config: &SdkConfig) -> Result<Self, SessionError> {
        config
            .credentials_provider()
            .map(|inner| Self { inner })
            .ok_or_else(|| SessionError::CredentialsUnavailable {
                reason: "no credentials provider configured".into(),
            })
    }
}

#[async_trait]
impl CredentialProvider for SdkCredentialProvider {
    fn name(&self) -> &'static str {
        "sdk"
    }

    async fn resolve(&self) -> Result<Credentials, SessionError> {
        let resolved = self.inner.provide_credentials().await.map_err(|e| {
            SessionError::CredentialsUnavailable {
                reason: aws_smithy_types::error::display::DisplayErrorContext(&e).to_string(),
            }
        })?;
        Ok(Credentials::new(
            resolved.access_key_id(),
            resolved.secret_access_key(),
            resolved.session_token().map(str::to_string),
        ))
    }
}

// ─── Static ──────────────────────────────────────────────────────────────────

/// Always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self) -> Result<Credentials, SessionError> {
        Ok(self.credentials.clone())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
