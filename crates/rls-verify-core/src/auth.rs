// crates/rls-verify-core/src/auth.rs
// ============================================================================
// Module: Session Issuance
// Description: Passwordless session minting through the identity service.
// Purpose: Obtain per-role access tokens without ever handling passwords.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! A session is minted in two steps: the service key requests a magic-link
//! token for an email (`/auth/v1/admin/generate_link`), and the hashed token
//! is then exchanged for an access/refresh pair (`/auth/v1/verify`). Any
//! failure is fatal for the run.

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::error::ProbeError;
use crate::response::RestResponse;
use crate::transport::Credentials;
use crate::transport::Endpoint;
use crate::transport::HttpTransport;
use crate::transport::SecretKey;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Authenticated end-user session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token for REST calls.
    pub access_token: SecretKey,
    /// Refresh token returned alongside the access token.
    pub refresh_token: SecretKey,
    /// Identity-service user object, when returned.
    pub user: Option<Value>,
}

/// `generate_link` response fields the issuer needs.
#[derive(Debug, Deserialize)]
struct GenerateLinkResponse {
    /// Hashed magic-link token.
    hashed_token: String,
}

/// `verify` response fields the issuer needs.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    /// Access token.
    access_token: String,
    /// Refresh token.
    refresh_token: String,
    /// Optional user object.
    #[serde(default)]
    user: Option<Value>,
}

// ============================================================================
// SECTION: Issuer
// ============================================================================

/// Mints sessions for arbitrary users using the service key.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    /// Shared HTTP transport.
    transport: HttpTransport,
    /// Service key credentials.
    credentials: Credentials,
}

impl SessionIssuer {
    /// Creates an issuer for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Transport`] when the HTTP client cannot be built.
    pub fn new(endpoint: &Endpoint) -> Result<Self, ProbeError> {
        Ok(Self {
            transport: HttpTransport::new(endpoint)?,
            credentials: Credentials {
                api_key: endpoint.service_key.clone(),
                bearer: endpoint.service_key.clone(),
            },
        })
    }

    /// Issues a session for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Auth`] when either step is rejected or returns an
    /// unexpected payload, and [`ProbeError::Transport`] on transport failure.
    pub fn issue(&self, email: &str) -> Result<Session, ProbeError> {
        let link_url = self.transport.url(&["auth", "v1", "admin", "generate_link"], &[])?;
        let body = json!({"type": "magiclink", "email": email});
        let response = self.transport.send(
            "auth/generate_link",
            Method::POST,
            link_url,
            &self.credentials,
            false,
            Some(&body),
        )?;
        let link: GenerateLinkResponse = decode_auth(email, "generate_link", &response)?;

        let verify_url = self.transport.url(&["auth", "v1", "verify"], &[])?;
        let body = json!({"type": "magiclink", "token_hash": link.hashed_token});
        let response = self.transport.send(
            "auth/verify",
            Method::POST,
            verify_url,
            &self.credentials,
            false,
            Some(&body),
        )?;
        let verified: VerifyResponse = decode_auth(email, "verify", &response)?;
        Ok(Session {
            access_token: SecretKey::new(verified.access_token),
            refresh_token: SecretKey::new(verified.refresh_token),
            user: verified.user,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks the status and decodes an identity-service payload.
fn decode_auth<T: for<'de> Deserialize<'de>>(
    email: &str,
    step: &str,
    response: &RestResponse,
) -> Result<T, ProbeError> {
    if !response.is_success() {
        return Err(ProbeError::Auth {
            email: email.to_string(),
            message: format!("{step} returned status {}: {}", response.status, response.snippet()),
        });
    }
    serde_json::from_str(&response.body).map_err(|err| ProbeError::Auth {
        email: email.to_string(),
        message: format!("{step} payload invalid: {err}"),
    })
}
