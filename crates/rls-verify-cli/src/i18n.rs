// crates/rls-verify-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for consistent console output.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The `rls-verify` CLI stores user-facing strings in a small translation
//! catalog so console lines, errors, and summaries share one wording.
//! All runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"role"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the message bundle.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "rls-verify {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("run.header", "RLS Security Tests"),
    ("run.setup_failed", "Failed to initialize harness: {error}"),
    ("run.fatal", "Run aborted: {error}"),
    ("run.events_failed", "Failed to open event log {path}: {error}"),
    ("run.report_failed", "Failed to write run report to {path}: {error}"),
    ("run.report_written", "Run report written to {path}"),
    ("discover.started", "Discovering test data..."),
    ("discover.found", "  Found {count} {resource}"),
    ("discover.found_sample", "  Found {count} {resource} (sample)"),
    ("discover.roles", "Role coverage:"),
    ("discover.role_user", "  {role}: {email} (groups: {groups})"),
    ("discover.role_missing", "  {role}: no user"),
    ("role.banner", "Testing as: {email} ({role})"),
    ("role.groups", "Groups: {groups}"),
    (
        "role.skipped",
        "[SKIP] No user with role '{role}' found. Create one before verifying this role.",
    ),
    ("suite.header", "--- {suite} ({role}) ---"),
    ("result.pass", "  [PASS] {name}"),
    ("result.fail", "  [FAIL] {name}"),
    ("result.fail_detail", "  [FAIL] {name} -- {detail}"),
    ("result.skip", "  [SKIP] {reason}"),
    (
        "cleanup.failed",
        "  [WARN] Cleanup of {resource} returned status {status}; probe rows may remain.",
    ),
    (
        "cleanup.leftover",
        "  [WARN] Cleanup of {resource} was accepted but row {id} is still present.",
    ),
    ("summary.line", "Summary: {passed}/{total} passed, {failed} failed, {skipped} skipped"),
    ("summary.failures", "Failures:"),
    ("summary.failure_item", "  {failure}"),
    ("list.none", "none"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the English catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static English catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
