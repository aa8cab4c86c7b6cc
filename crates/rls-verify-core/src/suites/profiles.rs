// crates/rls-verify-core/src/suites/profiles.rs
// ============================================================================
// Module: Profiles Suite
// Description: Profile visibility, self-edit, and role-escalation checks.
// Purpose: Prove users can edit their name but never promote themselves.
// Dependencies: serde_json
// ============================================================================

use serde_json::json;

use super::SuiteContext;
use super::UPDATED;
use super::restore_fields;
use crate::assertions::assert_row_presence;
use crate::assertions::assert_status;
use crate::error::ProbeError;
use crate::query::Filters;
use crate::role::Role;
use crate::tracker::ResultTracker;

/// Resource under test.
const RESOURCE: &str = "profiles";
/// Temporary name written by the self-edit probe.
const PROBE_NAME: &str = "Test Name Temp";
/// Statuses accepted when the escalation trigger rejects a role change.
const ESCALATION_DENIED: [u16; 4] = [400, 403, 409, 500];

/// Runs the profiles suite.
pub(super) fn run(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let response = ctx.client.select(RESOURCE, "*", &Filters::new())?;
    assert_row_presence(tracker, "profiles SELECT all", &response, true)?;

    if ctx.role.is_restricted() {
        own_name_update(ctx, tracker)?;
        self_escalation(ctx, tracker)?;
    }
    if ctx.role.is_admin() {
        admin_role_change(ctx, tracker)?;
    }
    Ok(())
}

/// Restricted users may rename themselves; the name is restored afterwards.
fn own_name_update(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let own = Filters::eq("id", ctx.user_id());
    let response = ctx.client.update(RESOURCE, &json!({"full_name": PROBE_NAME}), &own)?;
    assert_status(tracker, "profiles UPDATE own name", &response, &UPDATED);
    if response.is_success() {
        let original = json!({"full_name": ctx.user.full_name});
        restore_fields(ctx, tracker, RESOURCE, ctx.user_id(), &original)?;
    }
    Ok(())
}

/// Restricted users must not be able to change their own role.
fn self_escalation(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let own = Filters::eq("id", ctx.user_id());
    let escalate = json!({"role": Role::SystemAdmin.as_str()});
    let response = ctx.client.update(RESOURCE, &escalate, &own)?;
    assert_status(tracker, "profiles UPDATE role BLOCKED (trigger)", &response, &ESCALATION_DENIED);
    if response.is_success() {
        let original = json!({"role": ctx.user.role});
        restore_fields(ctx, tracker, RESOURCE, ctx.user_id(), &original)?;
    }
    Ok(())
}

/// Administrators may change another user's role; it is reverted afterwards.
fn admin_role_change(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let Some(member) = ctx.fixture.find_user_by_role(Role::TeamMember) else {
        tracker.record_skip("no team_member user to test role update on");
        return Ok(());
    };
    let target = Filters::eq("id", member.id.as_str());
    let promote = json!({"role": Role::Executive.as_str()});
    let response = ctx.client.update(RESOURCE, &promote, &target)?;
    assert_status(tracker, "profiles UPDATE other role ALLOWED", &response, &UPDATED);
    if response.is_success() {
        let original = json!({"role": Role::TeamMember.as_str()});
        restore_fields(ctx, tracker, RESOURCE, &member.id, &original)?;
    }
    Ok(())
}
