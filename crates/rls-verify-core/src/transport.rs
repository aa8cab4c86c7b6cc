// crates/rls-verify-core/src/transport.rs
// ============================================================================
// Module: HTTP Transport
// Description: Shared blocking HTTP plumbing for REST, RPC, and auth calls.
// Purpose: Build encoded URLs, attach credentials, and capture raw responses.
// Dependencies: reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The transport owns one blocking `reqwest` client per harness. It never
//! retries and leaves the request timeout at the transport default unless
//! the endpoint overrides it. Responses are captured as raw status and body;
//! interpreting them is left to callers.

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use url::Url;

use crate::error::ProbeError;
use crate::response::RestResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default user agent for outbound requests.
pub const DEFAULT_USER_AGENT: &str = "rls-verify/0.1";

// ============================================================================
// SECTION: Secrets
// ============================================================================

/// API key or token that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value for use in request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

// ============================================================================
// SECTION: Endpoint
// ============================================================================

/// Target backend and the credentials the harness holds for it.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Backend base URL; `/rest/v1` and `/auth/v1` are appended to it.
    pub base_url: Url,
    /// Public key sent as `apikey` on end-user requests.
    pub anon_key: SecretKey,
    /// Service key that bypasses row-level security.
    pub service_key: SecretKey,
    /// Optional request timeout override.
    pub timeout: Option<Duration>,
    /// User agent for outbound requests.
    pub user_agent: String,
}

impl Endpoint {
    /// Creates an endpoint with the default transport settings.
    #[must_use]
    pub fn new(base_url: Url, anon_key: SecretKey, service_key: SecretKey) -> Self {
        Self {
            base_url,
            anon_key,
            service_key,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Header credentials attached to a request.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    /// Value of the `apikey` header.
    pub(crate) api_key: SecretKey,
    /// Bearer token for the `Authorization` header.
    pub(crate) bearer: SecretKey,
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Blocking HTTP transport bound to one backend.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    /// Shared client; cloning is cheap.
    client: Client,
    /// Backend base URL.
    base_url: Url,
}

impl HttpTransport {
    /// Builds the transport for an endpoint.
    pub(crate) fn new(endpoint: &Endpoint) -> Result<Self, ProbeError> {
        let mut builder = Client::builder().user_agent(endpoint.user_agent.clone());
        if let Some(timeout) = endpoint.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| ProbeError::Transport {
            target: "client".to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: endpoint.base_url.clone(),
        })
    }

    /// Appends path segments and encoded query pairs to the base URL.
    pub(crate) fn url(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Url, ProbeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProbeError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    /// Sends one request and captures the raw response.
    pub(crate) fn send(
        &self,
        target: &str,
        method: Method,
        url: Url,
        credentials: &Credentials,
        prefer_representation: bool,
        body: Option<&Value>,
    ) -> Result<RestResponse, ProbeError> {
        let mut request = self
            .client
            .request(method, url)
            .header("apikey", credentials.api_key.expose())
            .header(AUTHORIZATION, format!("Bearer {}", credentials.bearer.expose()));
        if prefer_representation {
            request = request.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").json(body);
        }
        let response = request.send().map_err(|err| ProbeError::Transport {
            target: target.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|err| ProbeError::Transport {
            target: target.to_string(),
            message: err.to_string(),
        })?;
        Ok(RestResponse::new(status, body))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
