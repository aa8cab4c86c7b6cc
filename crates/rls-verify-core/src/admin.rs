// crates/rls-verify-core/src/admin.rs
// ============================================================================
// Module: Admin/Service Accessor
// Description: Service-key REST access that bypasses row-level security.
// Purpose: Discovery, setup, and compensating cleanup; never assertions.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`AdminClient`] uses the service key as both `apikey` and bearer token.
//! Reads fail fast on any non-2xx status because discovery cannot proceed
//! against a misconfigured environment. Writes return the raw response so
//! compensation can be reported without aborting the run.

use reqwest::Method;
use serde_json::Value;

use crate::error::ProbeError;
use crate::query::Filters;
use crate::query::QueryOp;
use crate::query::build_query;
use crate::response::RestResponse;
use crate::response::Row;
use crate::transport::Credentials;
use crate::transport::Endpoint;
use crate::transport::HttpTransport;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Privileged REST accessor.
#[derive(Debug, Clone)]
pub struct AdminClient {
    /// Shared HTTP transport.
    transport: HttpTransport,
    /// Service key credentials.
    credentials: Credentials,
}

impl AdminClient {
    /// Creates the accessor for `endpoint`.
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

    /// Reads up to `limit` rows (all rows when `None`) of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Status`] on a non-2xx status and
    /// [`ProbeError::Decode`] when the body is not a row array.
    pub fn query(
        &self,
        resource: &str,
        columns: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, ProbeError> {
        let op = QueryOp::Select {
            columns: columns.to_string(),
            limit,
        };
        self.read(resource, &op, &Filters::new())
    }

    /// Reads the rows of `resource` matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Status`] on a non-2xx status and
    /// [`ProbeError::Decode`] when the body is not a row array.
    pub fn query_filtered(
        &self,
        resource: &str,
        columns: &str,
        filters: &Filters,
    ) -> Result<Vec<Row>, ProbeError> {
        self.read(resource, &QueryOp::select(columns), filters)
    }

    /// Applies a privileged partial update, typically to restore probed state.
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

    /// Deletes rows created by a probe.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure or when `filters` is empty.
    pub fn delete(&self, resource: &str, filters: &Filters) -> Result<RestResponse, ProbeError> {
        let query = build_query(&QueryOp::Delete, filters)?;
        let url = self.transport.url(&["rest", "v1", resource], &query)?;
        self.transport.send(resource, Method::DELETE, url, &self.credentials, false, None)
    }

    /// Issues a read and decodes rows, failing on non-2xx.
    fn read(
        &self,
        resource: &str,
        op: &QueryOp,
        filters: &Filters,
    ) -> Result<Vec<Row>, ProbeError> {
        let query = build_query(op, filters)?;
        let url = self.transport.url(&["rest", "v1", resource], &query)?;
        let response =
            self.transport.send(resource, Method::GET, url, &self.credentials, false, None)?;
        if !response.is_success() {
            return Err(ProbeError::Status {
                target: resource.to_string(),
                status: response.status,
                body: response.snippet(),
            });
        }
        response.rows(resource)
    }
}
