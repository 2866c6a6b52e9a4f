//! Parameter and secret lookups.
//!
//! The runtime ARN lives in the regional parameter store and the bearer token
//! material in the secret store. [`ParameterSource`] is the seam; the
//! production implementation uses the SDK clients built from one `SdkConfig`.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueOutput;
use aws_sdk_ssm::operation::get_parameter::GetParameterOutput;
use aws_smithy_types::error::display::DisplayErrorContext;
use serde::Deserialize;

use crate::session::SessionError;

/// Runtime ARN parameter for SigV4-authenticated runtimes.
pub const SIGV4_RUNTIME_ARN_PARAMETER: &str = "/mcp_server/runtime_iam/agent_arn";

/// Runtime ARN parameter for bearer-authenticated runtimes.
pub const BEARER_RUNTIME_ARN_PARAMETER: &str = "/mcp_server/runtime/agent_arn";

/// Secret holding `{bearer_token, refresh_token, client_id}`.
pub const DEFAULT_BEARER_SECRET: &str = "mcp_server/cognito/credentials";

// ─── Types ───────────────────────────────────────────────────────────────────

/// Bearer token material stored as a JSON secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct BearerSecret {
    pub bearer_token: String,
    pub refresh_token: String,
    pub client_id: String,
}

impl std::fmt::Debug for BearerSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerSecret")
            .field("bearer_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Where named parameters and secrets are read from.
#[async_trait]
pub trait ParameterSource: Send + Sync {
    /// Value of a (possibly encrypted) parameter.
    async fn get_parameter(&self, name: &str) -> Result<String, SessionError>;

    /// String value of a secret.
    async fn get_secret(&self, secret_id: &str) -> Result<String, SessionError>;

    /// Fetch and parse the bearer token secret.
    async fn get_bearer_secret(&self, secret_id: &str) -> Result<BearerSecret, SessionError> {
        let raw = self.get_secret(secret_id).await?;
        serde_json::from_str(&raw).map_err(|e| SessionError::ParameterLookupFailed {
            name: secret_id.to_string(),
            reason: format!("secret is not a bearer token record: {e}"),
        })
    }
}

// ─── ParameterStore ──────────────────────────────────────────────────────────

/// SSM parameter store and Secrets Manager in the config's region.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    ssm: aws_sdk_ssm::Client,
    secrets: aws_sdk_secretsmanager::Client,
}

impl ParameterStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            ssm: aws_sdk_ssm::Client::new(config),
            secrets: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterSource for ParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, SessionError> {
        let output = self
            .ssm
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| lookup_failed(name, DisplayErrorContext(&e)))?;
        let value = parameter_value(name, output)?;
        tracing::info!(parameter = name, "resolved parameter");
        Ok(value)
    }

    async fn get_secret(&self, secret_id: &str) -> Result<String, SessionError> {
        let output = self
            .secrets
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| lookup_failed(secret_id, DisplayErrorContext(&e)))?;
        let value = secret_string(secret_id, output)?;
        tracing::info!(secret = secret_id, "resolved secret");
        Ok(value)
    }
}

fn lookup_failed(name: &str, reason: impl std::fmt::Display) -> SessionError {
    SessionError::ParameterLookupFailed {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn parameter_value(name: &str, output: GetParameterOutput) -> Result<String, SessionError> {
    output
        .parameter()
        .and_then(|p| p.value())
        .map(str::to_string)
        .ok_or_else(|| lookup_failed(name, "parameter has no value"))
}

fn secret_string(secret_id: &str, output: GetSecretValueOutput) -> Result<String, SessionError> {
    output
        .secret_string()
        .map(str::to_string)
        .ok_or_else(|| lookup_failed(secret_id, "secret has no string value"))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
