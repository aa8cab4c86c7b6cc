// crates/rls-verify-core/src/suites/entities.rs
// ============================================================================
// Module: Group-Scoped Entity Suites
// Description: Issues, focus snapshots, and meetings.
// Purpose: Check read scoping (and issue insert denial) on tenant tables.
// Dependencies: serde_json
// ============================================================================

use serde_json::json;

use super::INSERT_DENIED;
use super::SuiteContext;
use super::remove_created;
use super::scoped_read;
use crate::assertions::assert_status;
use crate::error::ProbeError;
use crate::tracker::ResultTracker;

/// Runs the issues suite.
pub(super) fn issues(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    scoped_read(ctx, tracker, "issues", "issues SELECT all")?;
    if !ctx.role.is_restricted() {
        return Ok(());
    }
    let Some(other) = ctx.fixture.group_outside(ctx.user_id()) else {
        tracker.record_skip("user is in all groups, cannot test cross-group issue insert");
        return Ok(());
    };
    let record = json!({
        "description": "RLS test issue",
        "group_id": other.id,
        "raised_by": ctx.user_id(),
    });
    let response = ctx.client.insert("issues", &record)?;
    assert_status(tracker, "issues INSERT other group BLOCKED", &response, &INSERT_DENIED);
    remove_created(ctx, tracker, "issues", &response)
}

/// Runs the focus snapshots suite.
pub(super) fn focus_snapshots(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    scoped_read(ctx, tracker, "focus_snapshots", "focus_snapshots SELECT all")
}

/// Runs the meetings suite.
pub(super) fn meetings(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    scoped_read(ctx, tracker, "meetings", "meetings SELECT all")
}
