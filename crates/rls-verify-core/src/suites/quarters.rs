// crates/rls-verify-core/src/suites/quarters.rs
// ============================================================================
// Module: Quarters Suite
// Description: Global quarter visibility and admin-only creation.
// Purpose: Prove every role reads quarters and only admins create them.
// Dependencies: serde_json
// ============================================================================

use serde_json::json;

use super::CREATED;
use super::INSERT_DENIED;
use super::SuiteContext;
use super::remove_created;
use crate::assertions::assert_row_presence;
use crate::assertions::assert_status;
use crate::error::ProbeError;
use crate::query::Filters;
use crate::tracker::ResultTracker;

/// Resource under test.
const RESOURCE: &str = "quarters";

/// Runs the quarters suite.
pub(super) fn run(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let response = ctx.client.select(RESOURCE, "*", &Filters::new())?;
    assert_row_presence(tracker, "quarters SELECT", &response, true)?;

    let (name, acceptable) = if ctx.role.is_restricted() {
        ("quarters INSERT BLOCKED", INSERT_DENIED.as_slice())
    } else if ctx.role.is_admin() {
        ("quarters INSERT ALLOWED", CREATED.as_slice())
    } else {
        return Ok(());
    };
    let record = json!({
        "label": "RLS Test Q",
        "start_date": "2099-01-01",
        "end_date": "2099-03-31",
    });
    let response = ctx.client.insert(RESOURCE, &record)?;
    assert_status(tracker, name, &response, acceptable);
    remove_created(ctx, tracker, RESOURCE, &response)
}
