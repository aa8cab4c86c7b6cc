// crates/rls-verify-core/src/suites/mod.rs
// ============================================================================
// Module: Per-Entity Suites
// Description: Suite registry, shared suite context, and compensation helpers.
// Purpose: Run one entity's access-control checks for one role.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each [`Suite`] probes one table or procedure as the acting user and
//! records verdicts into the tracker. Suites branch on the role tier, never
//! on a user id. Every probe that unexpectedly (or expectedly) mutates data is
//! undone through the admin accessor before the next assertion runs.
//!
//! Missing fixture data (no cross-group row, no quarter) produces a skip,
//! never a pass.

mod entities;
mod groups;
mod profiles;
mod quarters;
mod rocks;
mod rpc;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::admin::AdminClient;
use crate::assertions::assert_row_presence;
use crate::assertions::assert_scoped_subset;
use crate::client::RestClient;
use crate::discovery::Fixture;
use crate::discovery::Profile;
use crate::error::ProbeError;
use crate::events::ProgressEvent;
use crate::query::Filters;
use crate::response::RestResponse;
use crate::role::Role;
use crate::tracker::ResultTracker;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Statuses accepted for a denied insert.
pub(crate) const INSERT_DENIED: [u16; 2] = [403, 401];
/// Statuses accepted for a denied RPC.
pub(crate) const RPC_DENIED: [u16; 3] = [400, 403, 500];
/// Statuses accepted for a successful insert.
pub(crate) const CREATED: [u16; 1] = [201];
/// Statuses accepted for a successful update.
pub(crate) const UPDATED: [u16; 1] = [200];
/// Group-scoping column shared by tenant tables.
pub(crate) const GROUP_FIELD: &str = "group_id";

// ============================================================================
// SECTION: Suite Registry
// ============================================================================

/// Per-entity suite, listed in canonical run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    /// Profile visibility, self-edit, and role escalation.
    Profiles,
    /// Group visibility and admin-only creation.
    Groups,
    /// Rock scoping and cross-group insert denial.
    Rocks,
    /// Issue scoping and cross-group insert denial.
    Issues,
    /// Focus snapshot scoping.
    FocusSnapshots,
    /// Meeting scoping.
    Meetings,
    /// Quarter visibility and admin-only creation.
    Quarters,
    /// `start_new_week` caller binding.
    RpcStartNewWeek,
    /// `roll_forward_rock` cross-group denial.
    RpcRollForwardRock,
    /// `promote_rock_idea` cross-group denial.
    RpcPromoteRockIdea,
}

impl Suite {
    /// Canonical run order.
    pub const ALL: [Self; 10] = [
        Self::Profiles,
        Self::Groups,
        Self::Rocks,
        Self::Issues,
        Self::FocusSnapshots,
        Self::Meetings,
        Self::Quarters,
        Self::RpcStartNewWeek,
        Self::RpcRollForwardRock,
        Self::RpcPromoteRockIdea,
    ];

    /// Returns the selection label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Groups => "groups",
            Self::Rocks => "rocks",
            Self::Issues => "issues",
            Self::FocusSnapshots => "focus_snapshots",
            Self::Meetings => "meetings",
            Self::Quarters => "quarters",
            Self::RpcStartNewWeek => "rpc_start_new_week",
            Self::RpcRollForwardRock => "rpc_roll_forward_rock",
            Self::RpcPromoteRockIdea => "rpc_promote_rock_idea",
        }
    }

    /// Returns the console heading for the suite.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::RpcStartNewWeek => "RPC: start_new_week",
            Self::RpcRollForwardRock => "RPC: roll_forward_rock",
            Self::RpcPromoteRockIdea => "RPC: promote_rock_idea",
            other => other.as_str(),
        }
    }

    /// Runs the suite for the acting user in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport or decode failure; assertion
    /// mismatches are recorded in `tracker` instead.
    pub fn run(
        self,
        ctx: &SuiteContext<'_>,
        tracker: &mut ResultTracker<'_>,
    ) -> Result<(), ProbeError> {
        match self {
            Self::Profiles => profiles::run(ctx, tracker),
            Self::Groups => groups::run(ctx, tracker),
            Self::Rocks => rocks::run(ctx, tracker),
            Self::Issues => entities::issues(ctx, tracker),
            Self::FocusSnapshots => entities::focus_snapshots(ctx, tracker),
            Self::Meetings => entities::meetings(ctx, tracker),
            Self::Quarters => quarters::run(ctx, tracker),
            Self::RpcStartNewWeek => rpc::start_new_week(ctx, tracker),
            Self::RpcRollForwardRock => rpc::roll_forward_rock(ctx, tracker),
            Self::RpcPromoteRockIdea => rpc::promote_rock_idea(ctx, tracker),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a suite label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown suite: {0}")]
pub struct UnknownSuite(pub String);

impl FromStr for Suite {
    type Err = UnknownSuite;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.as_str() == value)
            .ok_or_else(|| UnknownSuite(value.to_string()))
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Everything a suite needs for one role pass.
pub struct SuiteContext<'a> {
    /// Client authenticated as the acting user.
    pub client: &'a RestClient,
    /// Privileged accessor used only for compensation.
    pub admin: &'a AdminClient,
    /// Role under test.
    pub role: Role,
    /// Acting user.
    pub user: &'a Profile,
    /// Reference data.
    pub fixture: &'a Fixture,
}

impl SuiteContext<'_> {
    /// Returns the acting user's group ids.
    #[must_use]
    pub fn own_groups(&self) -> BTreeSet<String> {
        self.fixture.group_set(&self.user.id)
    }

    /// Returns the acting user's id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

// ============================================================================
// SECTION: Shared Checks
// ============================================================================

/// Reads `resource` and applies the tier's visibility rule.
///
/// Restricted users must see only rows of their own groups; other tiers must
/// see at least one row.
pub(crate) fn scoped_read(
    ctx: &SuiteContext<'_>,
    tracker: &mut ResultTracker<'_>,
    resource: &str,
    all_name: &str,
) -> Result<(), ProbeError> {
    let response = ctx.client.select(resource, "*", &Filters::new())?;
    if ctx.role.is_restricted() {
        let name = format!("{resource} SELECT: only own group");
        assert_scoped_subset(tracker, &name, &response, GROUP_FIELD, &ctx.own_groups())
    } else {
        assert_row_presence(tracker, all_name, &response, true)
    }
}

// ============================================================================
// SECTION: Compensation
// ============================================================================

/// Deletes the row a successful insert probe created.
///
/// Does nothing unless `response` is a 201 carrying a row id. The delete goes
/// through the admin accessor and is confirmed with a follow-up read. A
/// rejected delete is reported as [`ProgressEvent::CleanupFailed`]; a row
/// that survives an accepted delete as [`ProgressEvent::CleanupLeftover`].
pub(crate) fn remove_created(
    ctx: &SuiteContext<'_>,
    tracker: &ResultTracker<'_>,
    resource: &str,
    response: &RestResponse,
) -> Result<(), ProbeError> {
    if response.status != 201 {
        return Ok(());
    }
    let Some(id) = response.first_row_id(resource)? else {
        return Ok(());
    };
    let filters = Filters::eq("id", id.as_str());
    let deleted = ctx.admin.delete(resource, &filters)?;
    if !deleted.is_success() {
        report_cleanup(tracker, resource, deleted.status);
        return Ok(());
    }
    let leftover = ctx.admin.query_filtered(resource, "id", &filters)?;
    if !leftover.is_empty() {
        tracker.emit(&ProgressEvent::CleanupLeftover {
            resource: resource.to_string(),
            id,
        });
    }
    Ok(())
}

/// Restores the given fields of one row through the admin accessor.
pub(crate) fn restore_fields(
    ctx: &SuiteContext<'_>,
    tracker: &ResultTracker<'_>,
    resource: &str,
    id: &str,
    fields: &serde_json::Value,
) -> Result<(), ProbeError> {
    let restored = ctx.admin.update(resource, fields, &Filters::eq("id", id))?;
    if !restored.is_success() {
        report_cleanup(tracker, resource, restored.status);
    }
    Ok(())
}

/// Emits a cleanup failure event.
fn report_cleanup(tracker: &ResultTracker<'_>, resource: &str, status: u16) {
    tracker.emit(&ProgressEvent::CleanupFailed {
        resource: resource.to_string(),
        status,
    });
}

// ============================================================================
// SECTION: Tests
// ============================================================================
