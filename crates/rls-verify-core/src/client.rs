// crates/rls-verify-core/src/client.rs
// ============================================================================
// Module: REST Client Adapter
// Description: End-user PostgREST client bound to one authenticated session.
// Purpose: Issue the same select/insert/update/delete/RPC calls as the app.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`RestClient`] sends requests with the public key as `apikey` and the
//! session access token as bearer, so every call is subject to row-level
//! security exactly as in production. Each method returns the raw
//! [`RestResponse`]; non-2xx statuses are data for the assertion helpers.

use reqwest::Method;
use serde_json::Value;

use crate::auth::Session;
use crate::error::ProbeError;
use crate::query::Filters;
use crate::query::QueryOp;
use crate::query::build_query;
use crate::response::RestResponse;
use crate::transport::Credentials;
use crate::transport::Endpoint;
use crate::transport::HttpTransport;

// ============================================================================
// SECTION: Client
// ============================================================================

/// REST client authenticated as a single end user.
#[derive(Debug, Clone)]
pub struct RestClient {
    /// Shared HTTP transport.
    transport: HttpTransport,
    /// Anon key plus the user's access token.
    credentials: Credentials,
}

impl RestClient {
    /// Creates a client for `session` against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Transport`] when the HTTP client cannot be built.
    pub fn new(endpoint: &Endpoint, session: &Session) -> Result<Self, ProbeError> {
        Ok(Self {
            transport: HttpTransport::new(endpoint)?,
            credentials: Credentials {
                api_key: endpoint.anon_key.clone(),
                bearer: session.access_token.clone(),
            },
        })
    }

    /// Reads `resource` with a column projection and equality filters.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure or an invalid query.
    pub fn select(
        &self,
        resource: &str,
        columns: &str,
        filters: &Filters,
    ) -> Result<RestResponse, ProbeError> {
        let query = build_query(&QueryOp::select(columns), filters)?;
        let url = self.transport.url(&["rest", "v1", resource], &query)?;
        self.transport.send(resource, Method::GET, url, &self.credentials, true, None)
    }

    /// Inserts `record` into `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure.
    pub fn insert(&self, resource: &str, record: &Value) -> Result<RestResponse, ProbeError> {
        let url = self.transport.url(&["rest", "v1", resource], &[])?;
        self.transport.send(resource, Method::POST, url, &self.credentials, true, Some(record))
    }

    /// Applies a partial update to the rows of `resource` matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure or when `filters` is empty.
    pub fn update(
        &self,
        resource: &str,
        fields: &Value,
        filters: &Filters,
    ) -> Result<RestResponse, ProbeError> {
        let query = build_query(&QueryOp::Update, filters)?;
        let url = self.transport.url(&["rest", "v1", resource], &query)?;
        self.transport.send(resource, Method::PATCH, url, &self.credentials, true, Some(fields))
    }

    /// Deletes the rows of `resource` matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure or when `filters` is empty.
    pub fn delete(&self, resource: &str, filters: &Filters) -> Result<RestResponse, ProbeError> {
        let query = build_query(&QueryOp::Delete, filters)?;
        let url = self.transport.url(&["rest", "v1", resource], &query)?;
        self.transport.send(resource, Method::DELETE, url, &self.credentials, true, None)
    }

    /// Invokes the remote procedure `name` with a flat parameter mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure.
    pub fn rpc(&self, name: &str, params: &Value) -> Result<RestResponse, ProbeError> {
        let url = self.transport.url(&["rest", "v1", "rpc", name], &[])?;
        let target = format!("rpc/{name}");
        self.transport.send(&target, Method::POST, url, &self.credentials, true, Some(params))
    }
}
