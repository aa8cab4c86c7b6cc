// crates/rls-verify-cli/src/lib.rs
// ============================================================================
// Module: RLS Verify CLI Library
// Description: Shared helpers for the rls-verify command-line interface.
// Purpose: Provide reusable components (i18n, console sink) for the binary.
// Dependencies: rls-verify-core
// ============================================================================

//! ## Overview
//! This library houses the message catalog and the console progress sink.
//! The binary entry point (`src/main.rs`) imports these helpers to keep all
//! user-facing output consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Console rendering of progress events.
pub mod console;
/// Internationalization helpers and message catalog.
pub mod i18n;
