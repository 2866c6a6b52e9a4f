//! Bearer token expiry checks and refresh.
//!
//! Deciding whether a token needs refreshing is a pure function
//! ([`check_token`]); the refresh itself is a separate network step behind
//! the [`TokenRefresher`] trait. A token that cannot be decoded is treated
//! exactly like an expired one.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cognitoidentityprovider::error::DisplayErrorContext;
use aws_sdk_cognitoidentityprovider::operation::initiate_auth::InitiateAuthOutput;
use aws_sdk_cognitoidentityprovider::types::AuthFlowType;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::session::SessionError;

/// Tokens with less validity left than this are refreshed.
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Outcome of a token expiry check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Still valid for at least the refresh margin.
    Valid(String),
    /// Expiring soon, already expired, or undecodable.
    Expired,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: f64,
}

/// Check a JWT-shaped bearer token against `now`.
pub fn check_token(token: &str, now: DateTime<Utc>) -> TokenStatus {
    match decode_expiry(token) {
        Some(exp)
            if exp
                .checked_sub(now.timestamp())
                .is_some_and(|left| left >= REFRESH_MARGIN_SECS) =>
        {
            TokenStatus::Valid(token.to_string())
        }
        _ => TokenStatus::Expired,
    }
}

/// Decode the `exp` claim from the payload segment, restoring padding.
fn decode_expiry(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    segments.next()?;

    let mut padded = payload.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let bytes = URL_SAFE.decode(padded.as_bytes()).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Some(claims.exp.floor() as i64)
}

// ─── Refresh ─────────────────────────────────────────────────────────────────

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, client_id: &str, refresh_token: &str) -> Result<String, SessionError>;
}

/// Return `token` unchanged if it is still valid, otherwise refresh it.
///
/// Decode failures force a refresh; refresh failures propagate.
pub async fn refresh_if_needed<R: TokenRefresher + ?Sized>(
    token: &str,
    client_id: &str,
    refresh_token: &str,
    refresher: &R,
    now: DateTime<Utc>,
) -> Result<String, SessionError> {
    match check_token(token, now) {
        TokenStatus::Valid(token) => Ok(token),
        TokenStatus::Expired => {
            tracing::info!(client_id, "bearer token expiring or invalid, refreshing");
            let fresh = refresher.refresh(client_id, refresh_token).await?;
            tracing::info!("bearer token refreshed");
            Ok(fresh)
        }
    }
}

/// Cognito user-pool refresher (`InitiateAuth` with `REFRESH_TOKEN_AUTH`).
#[derive(Debug, Clone)]
pub struct CognitoRefresher {
    client: CognitoClient,
}

impl CognitoRefresher {
    /// Refresher for the identity provider in the config's region.
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: CognitoClient::new(config),
        }
    }
}

#[async_trait]
impl TokenRefresher for CognitoRefresher {
    async fn refresh(&self, client_id: &str, refresh_token: &str) -> Result<String, SessionError> {
        let output = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::RefreshTokenAuth)
            .client_id(client_id)
            .auth_parameters("REFRESH_TOKEN", refresh_token)
            .send()
            .await
            .map_err(|e| SessionError::TokenRefreshFailed {
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        access_token(output)
    }
}

/// `AuthenticationResult.AccessToken`, or `TokenRefreshFailed` when the
/// provider answered with a challenge instead.
fn access_token(output: InitiateAuthOutput) -> Result<String, SessionError> {
    if let Some(challenge) = output.challenge_name() {
        return Err(SessionError::TokenRefreshFailed {
            reason: format!("identity provider requested challenge {}", challenge.as_str()),
        });
    }
    output
        .authentication_result()
        .and_then(|result| result.access_token())
        .map(str::to_string)
        .ok_or_else(|| SessionError::TokenRefreshFailed {
            reason: "response carried no AuthenticationResult".into(),
        })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
