// crates/rls-verify-core/src/error.rs
// ============================================================================
// Module: Probe Errors
// Description: Error taxonomy for setup, transport, and decode failures.
// Purpose: Separate fatal harness failures from recorded assertion mismatches.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ProbeError`] covers every failure that aborts a run: misconfiguration,
//! rejected privileged queries, session issuance failures, transport errors,
//! and malformed JSON where decoding is required. Assertion mismatches are
//! never errors; they are recorded by the tracker.

use thiserror::Error;

use crate::query::QueryError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal harness error.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The HTTP transport failed before a response was received.
    #[error("transport error calling {target}: {message}")]
    Transport {
        /// Request target (resource, procedure, or auth endpoint).
        target: String,
        /// Transport failure description.
        message: String,
    },
    /// A privileged or setup request returned a non-success status.
    #[error("{target} returned status {status}: {body}")]
    Status {
        /// Request target.
        target: String,
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
    /// A response body could not be decoded as the expected JSON shape.
    #[error("failed to decode {target} response: {message}")]
    Decode {
        /// Request target.
        target: String,
        /// Decoder error description.
        message: String,
    },
    /// Session issuance failed.
    #[error("session issuance failed for {email}: {message}")]
    Auth {
        /// Email address the session was requested for.
        email: String,
        /// Failure description.
        message: String,
    },
    /// A query could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// A request URL could not be constructed.
    #[error("invalid request url: {0}")]
    Url(String),
    /// Report artifacts could not be written.
    #[error("report write failed: {0}")]
    Report(String),
}
