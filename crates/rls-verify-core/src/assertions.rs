// crates/rls-verify-core/src/assertions.rs
// ============================================================================
// Module: Assertion Helpers
// Description: Status, row-presence, row-count, and scope checks.
// Purpose: Turn raw responses into recorded pass/fail outcomes.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Helpers record into the [`ResultTracker`] and never fail on a mismatch:
//! an unexpected status or row set is data. Only a 200 response whose body
//! cannot be decoded returns an error, because that means the harness or the
//! environment is broken rather than a policy.

use std::collections::BTreeSet;

use crate::error::ProbeError;
use crate::response::RestResponse;
use crate::response::Row;
use crate::response::RowExt;
use crate::tracker::ResultTracker;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Passes iff `response.status` is one of `acceptable`.
pub fn assert_status(
    tracker: &mut ResultTracker<'_>,
    name: &str,
    response: &RestResponse,
    acceptable: &[u16],
) {
    if acceptable.contains(&response.status) {
        tracker.record_pass(name);
    } else {
        let expected = bracketed(acceptable.iter());
        let snippet = response.snippet();
        let detail = format!("expected {expected}, got {}: {snippet}", response.status);
        tracker.record_fail(name, &detail);
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Passes iff the response is 200 and its emptiness matches `expect_non_empty`.
///
/// # Errors
///
/// Returns [`ProbeError::Decode`] when a 200 body is not a row array.
pub fn assert_row_presence(
    tracker: &mut ResultTracker<'_>,
    name: &str,
    response: &RestResponse,
    expect_non_empty: bool,
) -> Result<(), ProbeError> {
    let Some(rows) = ok_rows(tracker, name, response)? else {
        return Ok(());
    };
    if rows.is_empty() == expect_non_empty {
        let expected = if expect_non_empty { "rows" } else { "empty" };
        tracker.record_fail(name, &format!("expected {expected}, got {} rows", rows.len()));
    } else {
        tracker.record_pass(name);
    }
    Ok(())
}

/// Passes iff the response is 200 with at most `max` rows.
///
/// # Errors
///
/// Returns [`ProbeError::Decode`] when a 200 body is not a row array.
pub fn assert_row_count_at_most(
    tracker: &mut ResultTracker<'_>,
    name: &str,
    response: &RestResponse,
    max: usize,
) -> Result<(), ProbeError> {
    let Some(rows) = ok_rows(tracker, name, response)? else {
        return Ok(());
    };
    if rows.len() <= max {
        tracker.record_pass(name);
    } else {
        tracker.record_fail(name, &format!("expected <= {max} rows, got {}", rows.len()));
    }
    Ok(())
}

/// Passes iff the response is 200 with exactly `expected` rows.
///
/// # Errors
///
/// Returns [`ProbeError::Decode`] when a 200 body is not a row array.
pub fn assert_row_count_exact(
    tracker: &mut ResultTracker<'_>,
    name: &str,
    response: &RestResponse,
    expected: usize,
) -> Result<(), ProbeError> {
    let Some(rows) = ok_rows(tracker, name, response)? else {
        return Ok(());
    };
    if rows.len() == expected {
        tracker.record_pass(name);
    } else {
        tracker.record_fail(name, &format!("expected {expected}, got {}", rows.len()));
    }
    Ok(())
}

/// Passes iff every row's `field` value belongs to `allowed`.
///
/// Rows without the field count as outside the allowed set.
///
/// # Errors
///
/// Returns [`ProbeError::Decode`] when a 200 body is not a row array.
pub fn assert_scoped_subset(
    tracker: &mut ResultTracker<'_>,
    name: &str,
    response: &RestResponse,
    field: &str,
    allowed: &BTreeSet<String>,
) -> Result<(), ProbeError> {
    if response.status != 200 {
        tracker.record_fail(name, &format!("status {}", response.status));
        return Ok(());
    }
    let rows = response.rows(name)?;
    let extra = outside_scope(&rows, field, allowed);
    if extra.is_empty() {
        tracker.record_pass(name);
    } else {
        let listed = bracketed(extra.iter());
        tracker.record_fail(name, &format!("saw groups outside membership: {listed}"));
    }
    Ok(())
}

/// Returns the distinct `field` values (or `<missing>`) not in `allowed`.
#[must_use]
pub fn outside_scope(rows: &[Row], field: &str, allowed: &BTreeSet<String>) -> BTreeSet<String> {
    rows.iter()
        .map(|row| row.field_text(field).unwrap_or_else(|| "<missing>".to_string()))
        .filter(|value| !allowed.contains(value))
        .collect()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders items as `[a, b, c]`.
fn bracketed<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    let parts: Vec<String> = items.map(|item| item.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Decodes rows of a 200 response, recording a failure for other statuses.
fn ok_rows(
    tracker: &mut ResultTracker<'_>,
    name: &str,
    response: &RestResponse,
) -> Result<Option<Vec<Row>>, ProbeError> {
    if response.status != 200 {
        tracker.record_fail(name, &format!("expected 200, got {}", response.status));
        return Ok(None);
    }
    response.rows(name).map(Some)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
