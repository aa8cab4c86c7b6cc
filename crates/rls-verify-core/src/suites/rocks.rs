// crates/rls-verify-core/src/suites/rocks.rs
// ============================================================================
// Module: Rocks Suite
// Description: Rock scoping, cross-group insert denial, and admin bypass.
// Purpose: Prove rocks stay inside their group unless an admin acts.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

use super::CREATED;
use super::INSERT_DENIED;
use super::SuiteContext;
use super::remove_created;
use super::scoped_read;
use crate::assertions::assert_status;
use crate::error::ProbeError;
use crate::tracker::ResultTracker;

/// Resource under test.
const RESOURCE: &str = "rocks";

/// Runs the rocks suite.
pub(super) fn run(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    scoped_read(ctx, tracker, RESOURCE, "rocks SELECT all groups")?;

    if ctx.role.is_restricted() {
        cross_group_insert(ctx, tracker)?;
    }
    if ctx.role.is_admin() {
        admin_insert(ctx, tracker)?;
    }
    Ok(())
}

/// A restricted user must not create a rock in a group it does not belong to.
fn cross_group_insert(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let Some(other) = ctx.fixture.group_outside(ctx.user_id()) else {
        tracker.record_skip("user is in all groups, cannot test cross-group insert denial");
        return Ok(());
    };
    let quarter_id = ctx.fixture.first_quarter().map_or(Value::Null, |q| json!(q.id));
    let record = json!({
        "title": "RLS Test Rock",
        "group_id": other.id,
        "owner_id": ctx.user_id(),
        "quarter_id": quarter_id,
    });
    let response = ctx.client.insert(RESOURCE, &record)?;
    assert_status(tracker, "rocks INSERT other group BLOCKED", &response, &INSERT_DENIED);
    remove_created(ctx, tracker, RESOURCE, &response)
}

/// An administrator may create a rock in any group.
fn admin_insert(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let (Some(group), Some(quarter)) = (ctx.fixture.groups.first(), ctx.fixture.first_quarter())
    else {
        tracker.record_skip("no group or quarter for admin rock insert");
        return Ok(());
    };
    let record = json!({
        "title": "RLS Admin Test Rock",
        "group_id": group.id,
        "owner_id": ctx.user_id(),
        "quarter_id": quarter.id,
    });
    let response = ctx.client.insert(RESOURCE, &record)?;
    assert_status(tracker, "rocks INSERT any group (admin bypass)", &response, &CREATED);
    remove_created(ctx, tracker, RESOURCE, &response)
}
