//! Runtime endpoint descriptor and invocation URL construction.

use serde::{Deserialize, Serialize};

/// Default service host prefix.
pub const DEFAULT_SERVICE_HOST: &str = "bedrock-agentcore";

/// Default DNS suffix.
pub const DEFAULT_DOMAIN: &str = "amazonaws.com";

/// Default runtime qualifier.
pub const DEFAULT_QUALIFIER: &str = "DEFAULT";

/// Where a runtime lives. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub service_host: String,
    pub region: String,
    pub domain: String,
    /// Opaque remote resource name, usually a runtime ARN.
    pub resource_id: String,
    pub qualifier: String,
}

impl EndpointDescriptor {
    /// Endpoint with default host, domain and qualifier.
    pub fn new(region: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            service_host: DEFAULT_SERVICE_HOST.to_string(),
            region: region.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            resource_id: resource_id.into(),
            qualifier: DEFAULT_QUALIFIER.to_string(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// The resource id as a single URL path segment.
    ///
    /// Everything except unreserved characters is percent-encoded, `:` and
    /// `/` included, so decoding gives back the original string.
    pub fn encoded_resource(&self) -> String {
        urlencoding::encode(&self.resource_id).into_owned()
    }

    /// `https://<host>.<region>.<domain>/runtimes/<encoded>/invocations?qualifier=<q>`
    pub fn url(&self) -> String {
        format!(
            "https://{}.{}.{}/runtimes/{}/invocations?qualifier={}",
            self.service_host,
            self.region,
            self.domain,
            self.encoded_resource(),
            urlencoding::encode(&self.qualifier),
        )
    }
}
