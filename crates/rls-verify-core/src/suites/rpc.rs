// crates/rls-verify-core/src/suites/rpc.rs
// ============================================================================
// Module: RPC Suites
// Description: Cross-tenant denial for server-side procedures.
// Purpose: Prove procedures bind to the caller and the caller's groups.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Procedures run with elevated rights on the server, so each one must check
//! the caller itself. The probes pass identifiers the caller does not own and
//! expect a rejection. Procedure side effects are not compensated: a
//! procedure that accepts a foreign id has already failed the check.

use serde_json::json;

use super::RPC_DENIED;
use super::SuiteContext;
use crate::assertions::assert_status;
use crate::error::ProbeError;
use crate::tracker::ResultTracker;

/// Week date far outside any real data.
const PROBE_WEEK_DATE: &str = "2099-01-06";

/// `start_new_week` must reject a `p_user_id` other than the caller.
pub(super) fn start_new_week(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let other = ctx.fixture.other_user(ctx.user_id());
    let group = ctx.fixture.groups_of(ctx.user_id()).first();
    let (Some(other), Some(group)) = (other, group) else {
        tracker.record_skip("no other user or own group for start_new_week");
        return Ok(());
    };
    let params = json!({
        "p_user_id": other.id,
        "p_group_id": group,
        "p_new_week_date": PROBE_WEEK_DATE,
    });
    let response = ctx.client.rpc("start_new_week", &params)?;
    assert_status(tracker, "start_new_week with other user_id BLOCKED", &response, &RPC_DENIED);
    Ok(())
}

/// `roll_forward_rock` must reject a rock from a foreign group.
pub(super) fn roll_forward_rock(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    if !ctx.role.is_restricted() {
        tracker.record_skip("roll_forward_rock: cross-group denial only tested for team_member");
        return Ok(());
    }
    let rock = ctx.fixture.rock_outside(ctx.user_id());
    let (Some(rock), Some(quarter)) = (rock, ctx.fixture.first_quarter()) else {
        tracker.record_skip("no cross-group rock found to test");
        return Ok(());
    };
    let params = json!({
        "p_rock_id": rock.id,
        "p_new_quarter_id": quarter.id,
    });
    let response = ctx.client.rpc("roll_forward_rock", &params)?;
    assert_status(tracker, "roll_forward_rock other group BLOCKED", &response, &RPC_DENIED);
    Ok(())
}

/// `promote_rock_idea` must reject an idea from a foreign group.
pub(super) fn promote_rock_idea(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    if !ctx.role.is_restricted() {
        tracker.record_skip("promote_rock_idea: cross-group denial only tested for team_member");
        return Ok(());
    }
    let idea = ctx.fixture.idea_outside(ctx.user_id());
    let (Some(idea), Some(quarter)) = (idea, ctx.fixture.first_quarter()) else {
        tracker.record_skip("no cross-group rock idea found to test");
        return Ok(());
    };
    let params = json!({
        "p_idea_id": idea.id,
        "p_quarter_id": quarter.id,
        "p_owner_id": ctx.user_id(),
    });
    let response = ctx.client.rpc("promote_rock_idea", &params)?;
    assert_status(tracker, "promote_rock_idea other group BLOCKED", &response, &RPC_DENIED);
    Ok(())
}
