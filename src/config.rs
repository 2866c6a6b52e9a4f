//! Client configuration loading and resolution.
//!
//! Reads an optional YAML file, resolves `${VAR}` / `${VAR:-default}`
//! references, then layers command-line overrides on top. Anything left
//! unset falls back to the SDK's default region and credential chains.

use std::path::{Path, PathBuf};
use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::Deserialize;

use crate::endpoint::{EndpointDescriptor, DEFAULT_DOMAIN, DEFAULT_QUALIFIER};
use crate::parameters::{BEARER_RUNTIME_ARN_PARAMETER, DEFAULT_BEARER_SECRET, SIGV4_RUNTIME_ARN_PARAMETER};
use crate::session::transport::DEFAULT_REQUEST_TIMEOUT;
use crate::session::SessionError;

/// Env var that points at a config file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "AGENTCORE_SESSION_CONFIG";

// ─── Public Types ────────────────────────────────────────────────────────────

/// Which authentication scheme requests use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// SigV4-signed requests with ambient credentials.
    #[default]
    Sigv4,
    /// `Authorization: Bearer` with a stored, refreshable token.
    Bearer,
}

/// Client configuration (mirrors the YAML file).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub region: Option<String>,
    /// Runtime ARN. When absent it is looked up in the parameter store.
    #[serde(default)]
    pub runtime_arn: Option<String>,
    #[serde(default = "default_qualifier")]
    pub qualifier: String,
    #[serde(default)]
    pub auth: AuthMode,
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Named profile for the SDK credential and region chains.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Parameter holding the runtime ARN. Defaults depend on `auth`.
    #[serde(default)]
    pub runtime_arn_parameter: Option<String>,
    /// Secret holding the bearer token triple.
    #[serde(default = "default_bearer_secret")]
    pub bearer_secret: String,
}

fn default_qualifier() -> String {
    DEFAULT_QUALIFIER.to_string()
}
fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
fn default_bearer_secret() -> String {
    DEFAULT_BEARER_SECRET.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: None,
            runtime_arn: None,
            qualifier: default_qualifier(),
            auth: AuthMode::default(),
            domain: default_domain(),
            profile: None,
            request_timeout_secs: default_request_timeout_secs(),
            runtime_arn_parameter: None,
            bearer_secret: default_bearer_secret(),
        }
    }
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub region: Option<String>,
    pub runtime_arn: Option<String>,
    pub qualifier: Option<String>,
    pub auth: Option<AuthMode>,
}

impl ClientConfig {
    /// Layer command-line values over file values.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(region) = overrides.region {
            self.region = Some(region);
        }
        if let Some(arn) = overrides.runtime_arn {
            self.runtime_arn = Some(arn);
        }
        if let Some(qualifier) = overrides.qualifier {
            self.qualifier = qualifier;
        }
        if let Some(auth) = overrides.auth {
            self.auth = auth;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parameter name the runtime ARN is stored under for this auth mode.
    pub fn runtime_arn_parameter(&self) -> &str {
        match (&self.runtime_arn_parameter, self.auth) {
            (Some(name), _) => name,
            (None, AuthMode::Sigv4) => SIGV4_RUNTIME_ARN_PARAMETER,
            (None, AuthMode::Bearer) => BEARER_RUNTIME_ARN_PARAMETER,
        }
    }

    /// Load the shared SDK configuration: default credential chain and
    /// region provider, pinned to this config's region and profile when set.
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = self.configured_region() {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile.as_str());
        }
        loader.load().await
    }

    /// Region from config, else whatever the SDK's region chain found
    /// (`AWS_REGION`, the active profile, instance metadata).
    pub fn resolve_region(&self, sdk: &SdkConfig) -> Result<String, SessionError> {
        self.configured_region()
            .map(str::to_string)
            .or_else(|| sdk.region().map(|r| r.as_ref().to_string()))
            .filter(|r| !r.is_empty())
            .ok_or_else(|| SessionError::ConfigError {
                reason: "no region configured: pass --region, set AWS_REGION, or configure ~/.aws/config"
                    .into(),
            })
    }

    fn configured_region(&self) -> Option<&str> {
        self.region.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }

    /// Endpoint for `runtime_arn` in `region` with this config's qualifier and domain.
    pub fn endpoint(&self, region: &str, runtime_arn: &str) -> EndpointDescriptor {
        EndpointDescriptor::new(region, runtime_arn)
            .with_qualifier(self.qualifier.as_str())
            .with_domain(self.domain.as_str())
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Default config location: `$AGENTCORE_SESSION_CONFIG`, else
/// `<config dir>/agentcore-session/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("agentcore-session").join("config.yaml"))
}

/// Load and parse a config file, interpolating environment variables.
pub fn load_config(path: &Path) -> Result<ClientConfig, SessionError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SessionError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    parse_config(&interpolate_env_vars(&raw))
}

/// Load `explicit` if given (it must exist), otherwise the default path if
/// present, otherwise built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ClientConfig, SessionError> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path)
        }
        _ => Ok(ClientConfig::default()),
    }
}

fn parse_config(yaml: &str) -> Result<ClientConfig, SessionError> {
    // An empty file deserializes as null, not as an empty mapping.
    if yaml.trim().is_empty() {
        return Ok(ClientConfig::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| SessionError::ConfigError {
        reason: format!("failed to parse config: {e}"),
    })
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

fn interpolate_env_vars(input: &str) -> String {
    interpolate_with(input, |name| std::env::var(name).ok())
}

/// Replace `${VAR}` and `${VAR:-default}` using `lookup`.
fn interpolate_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                expr.push(c);
            }
            let resolved = match expr.split_once(":-") {
                Some((name, default)) => lookup(name).unwrap_or_else(|| expand_tilde(default)),
                None => lookup(&expr).unwrap_or_default(),
            };
            result.push_str(&resolved);
        } else {
            result.push(ch);
        }
    }

    result
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
