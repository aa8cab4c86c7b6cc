// crates/rls-verify-config/src/lib.rs
// ============================================================================
// Module: RLS Verify Config Library
// Description: Canonical config model and validation for the harness.
// Purpose: Single source of truth for rls-verify.toml semantics.
// Dependencies: rls-verify-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `rls-verify-config` defines the configuration model for the RLS
//! verification harness. Files and environment overrides are merged, then
//! validated fail-closed before any request is sent to the target backend.
//!
//! Security posture: the service key bypasses row-level security, so config
//! values are never echoed in `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::ConfigEnv;
