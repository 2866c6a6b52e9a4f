//! AWS Signature Version 4 request signing.
//!
//! Signs an [`HttpRequest`] in place: adds `Host`, `X-Amz-Date`, the
//! optional `X-Amz-Security-Token`, then computes the signature over the
//! final header set and body and writes the `Authorization` header. Any
//! header added after signing invalidates the signature.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, HOST};
use reqwest::Url;
use sha2::{Digest, Sha256};

use super::credentials::Credentials;
use crate::session::transport::HttpRequest;
use crate::session::SessionError;

type HmacSha256 = Hmac<Sha256>;

// ─── Constants ───────────────────────────────────────────────────────────────

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

const AMZ_DATE_HEADER: &str = "x-amz-date";
const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";

/// Headers never included in the signature.
const UNSIGNED_HEADERS: &[&str] = &["authorization", "user-agent", "expect", "x-amzn-trace-id"];

// ─── Signer ──────────────────────────────────────────────────────────────────

/// Signs requests for one service in one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigV4Signer {
    service: String,
    region: String,
}

impl SigV4Signer {
    pub fn new(service: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
        }
    }

    /// Sign `request` at `time` and return the hex signature.
    ///
    /// Deterministic: the same request, credentials and time always give
    /// byte-identical headers.
    pub fn sign(
        &self,
        request: &mut HttpRequest,
        credentials: &Credentials,
        time: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let url = Url::parse(&request.url).map_err(|e| SessionError::ConfigError {
            reason: format!("invalid URL '{}': {e}", request.url),
        })?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SessionError::ConfigError {
                    reason: format!("URL '{}' has no host", request.url),
                })
            }
        };

        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = time.format("%Y%m%d").to_string();

        request.headers.remove(AUTHORIZATION);
        request.headers.insert(HOST, header_value(&host)?);
        request
            .headers
            .insert(HeaderName::from_static(AMZ_DATE_HEADER), header_value(&amz_date)?);
        match &credentials.session_token {
            Some(token) => {
                request.headers.insert(
                    HeaderName::from_static(SECURITY_TOKEN_HEADER),
                    header_value(token)?,
                );
            }
            None => {
                request.headers.remove(SECURITY_TOKEN_HEADER);
            }
        }

        let (canonical_headers, signed_headers) = canonical_headers(request);
        let canonical_request = [
            request.method.as_str().to_string(),
            canonical_uri(url.path()),
            canonical_query(url.query().unwrap_or("")),
            canonical_headers,
            signed_headers.clone(),
            sha256_hex(&request.body),
        ]
        .join("\n");

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let key = signing_key(&credentials.secret_access_key, &date, &self.region, &self.service)?;
        let signature = hex(&hmac_sha256(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id
        );
        request.headers.insert(AUTHORIZATION, header_value(&authorization)?);

        tracing::trace!(
            service = %self.service,
            region = %self.region,
            signed_headers = %signed_headers,
            "request signed"
        );

        Ok(signature)
    }
}

// ─── Canonical form ──────────────────────────────────────────────────────────

/// Canonical header block (`name:value\n` per header) and the
/// `;`-joined signed header list, both sorted by lowercase name.
fn canonical_headers(request: &HttpRequest) -> (String, String) {
    let mut headers: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, value) in &request.headers {
        if UNSIGNED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let value = String::from_utf8_lossy(value.as_bytes());
        headers
            .entry(name.as_str())
            .or_default()
            .push(collapse_whitespace(&value));
    }

    let block: String = headers
        .iter()
        .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
        .collect();
    let signed = headers.keys().copied().collect::<Vec<_>>().join(";");
    (block, signed)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URI-encode a path for signing. Existing percent escapes are encoded
/// again, as the service expects for non-S3 endpoints.
pub(crate) fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len() * 2);
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Sort `key=value` pairs of a query string, keeping their encoding.
pub(crate) fn canonical_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<(&str, &str)> = query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

// ─── Crypto helpers ──────────────────────────────────────────────────────────

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SessionError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| SessionError::ConfigError {
        reason: format!("invalid HMAC key: {e}"),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the per-day, per-region, per-service signing key.
pub(crate) fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SessionError> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn header_value(value: &str) -> Result<HeaderValue, SessionError> {
    HeaderValue::from_str(value).map_err(|e| SessionError::ConfigError {
        reason: format!("invalid header value: {e}"),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
