// crates/rls-verify-core/src/lib.rs
// ============================================================================
// Module: RLS Verify Core Library
// Description: Row-level-security verification harness for PostgREST backends.
// Purpose: Authenticate as each role, probe protected resources, and tally outcomes.
// Dependencies: reqwest, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! `rls-verify-core` drives access-control probes against a PostgREST-style
//! REST layer. A privileged [`AdminClient`] discovers reference data, a
//! [`SessionIssuer`] mints per-user sessions, and each [`RestClient`] issues
//! the same calls the production application would. Suites record their
//! verdicts into an explicit [`ResultTracker`] owned by the [`Harness`].
//!
//! Execution is strictly sequential: one role, one suite, one HTTP call at a
//! time. Mutating probes that succeed are compensated through the admin
//! accessor before the next assertion runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod admin;
pub mod assertions;
pub mod auth;
pub mod client;
pub mod discovery;
pub mod error;
pub mod events;
pub mod harness;
pub mod query;
pub mod report;
pub mod response;
pub mod role;
pub mod suites;
pub mod tracker;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use admin::AdminClient;
pub use auth::Session;
pub use auth::SessionIssuer;
pub use client::RestClient;
pub use discovery::Fixture;
pub use discovery::Profile;
pub use discovery::discover;
pub use error::ProbeError;
pub use events::FanoutSink;
pub use events::JsonLinesSink;
pub use events::NoopSink;
pub use events::ProgressEvent;
pub use events::ProgressSink;
pub use events::RecordingSink;
pub use harness::Harness;
pub use harness::RunOutcome;
pub use harness::RunPlan;
pub use query::Filters;
pub use query::QueryError;
pub use query::QueryOp;
pub use query::build_query;
pub use report::RunReport;
pub use response::RestResponse;
pub use response::Row;
pub use role::Role;
pub use role::UnknownRole;
pub use suites::Suite;
pub use suites::UnknownSuite;
pub use tracker::OutcomeStatus;
pub use tracker::ResultTracker;
pub use tracker::RunSummary;
pub use tracker::TestOutcome;
pub use transport::Endpoint;
pub use transport::SecretKey;
