// crates/rls-verify-core/src/suites/groups.rs
// ============================================================================
// Module: Groups Suite
// Description: Group visibility and admin-only group creation.
// Purpose: Prove tenants see only their groups and cannot create new ones.
// Dependencies: serde_json
// ============================================================================

use serde_json::json;

use super::CREATED;
use super::INSERT_DENIED;
use super::SuiteContext;
use super::remove_created;
use crate::assertions::assert_row_count_exact;
use crate::assertions::assert_row_presence;
use crate::assertions::assert_scoped_subset;
use crate::assertions::assert_status;
use crate::error::ProbeError;
use crate::query::Filters;
use crate::tracker::ResultTracker;

/// Resource under test.
const RESOURCE: &str = "groups";

/// Runs the groups suite.
pub(super) fn run(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
) -> Result<(), ProbeError> {
    let response = ctx.client.select(RESOURCE, "*", &Filters::new())?;
    if ctx.role.is_restricted() {
        let own = ctx.own_groups();
        assert_scoped_subset(tracker, "groups SELECT: only own groups", &response, "id", &own)?;
    } else {
        assert_row_presence(tracker, "groups SELECT all", &response, true)?;
        if response.status == 200 {
            let expected = ctx.fixture.groups.len();
            assert_row_count_exact(tracker, "groups SELECT: sees ALL groups", &response, expected)?;
        }
    }

    let record = json!({"name": "RLS Test Group"});
    if ctx.role.is_restricted() {
        let response = ctx.client.insert(RESOURCE, &record)?;
        assert_status(tracker, "groups INSERT BLOCKED", &response, &INSERT_DENIED);
        remove_created(ctx, tracker, RESOURCE, &response)?;
    } else if ctx.role.is_admin() {
        let response = ctx.client.insert(RESOURCE, &record)?;
        assert_status(tracker, "groups INSERT ALLOWED", &response, &CREATED);
        remove_created(ctx, tracker, RESOURCE, &response)?;
    }
    Ok(())
}
