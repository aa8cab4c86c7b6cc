// crates/rls-verify-core/src/discovery.rs
// ============================================================================
// Module: Data Discovery
// Description: Privileged load of the reference data every suite relies on.
// Purpose: Pick acting users, memberships, and cross-tenant targets up front.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Discovery runs once per run through the [`AdminClient`], so row-level
//! security never hides reference data. Users, groups, and memberships load
//! in full; entity tables load as bounded samples that only need to contain
//! one cross-group row. Any failure aborts the run because no assertion is
//! meaningful without the fixture.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::admin::AdminClient;
use crate::error::ProbeError;
use crate::events::ProgressEvent;
use crate::events::ProgressSink;
use crate::response::Row;
use crate::role::Role;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Rows sampled from `rocks`.
pub const ROCK_SAMPLE_LIMIT: usize = 10;
/// Rows sampled from `issues`, `meetings`, `quarters`, and `rock_ideas`.
pub const SAMPLE_LIMIT: usize = 5;

/// Projection for `group_members`.
const MEMBERSHIP_COLUMNS: &str = "id,group_id,user_id,role_in_group";
/// Projection for `rocks`.
const ROCK_COLUMNS: &str = "id,title,group_id,owner_id";
/// Projection for `issues`.
const ISSUE_COLUMNS: &str = "id,description,group_id,raised_by";
/// Projection for `rock_ideas`.
const IDEA_COLUMNS: &str = "id,description,group_id";

// ============================================================================
// SECTION: Records
// ============================================================================

/// User profile with its application role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// User id.
    pub id: String,
    /// Sign-in email.
    pub email: String,
    /// Display name, restored after name-update probes.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Raw role label; unknown labels are kept but never selected.
    pub role: String,
}

/// Tenant group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: String,
    /// Group name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Group membership.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Membership {
    /// Membership id.
    pub id: String,
    /// Group id.
    pub group_id: String,
    /// Member user id.
    pub user_id: String,
    /// Role within the group.
    #[serde(default)]
    pub role_in_group: Option<String>,
}

/// Sampled rock.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RockSample {
    /// Rock id.
    pub id: String,
    /// Rock title.
    #[serde(default)]
    pub title: Option<String>,
    /// Owning group.
    pub group_id: String,
    /// Owning user.
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Sampled issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueSample {
    /// Issue id.
    pub id: String,
    /// Issue text.
    #[serde(default)]
    pub description: Option<String>,
    /// Owning group.
    pub group_id: String,
    /// Reporting user.
    #[serde(default)]
    pub raised_by: Option<String>,
}

/// Sampled meeting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeetingSample {
    /// Meeting id.
    pub id: String,
    /// Meeting date.
    #[serde(default)]
    pub meeting_date: Option<String>,
    /// Owning group.
    pub group_id: String,
}

/// Sampled quarter (global, not group-scoped).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuarterSample {
    /// Quarter id.
    pub id: String,
    /// Quarter label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether this is the current quarter.
    #[serde(default)]
    pub is_current: Option<bool>,
}

/// Sampled rock idea.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RockIdeaSample {
    /// Idea id.
    pub id: String,
    /// Idea text.
    #[serde(default)]
    pub description: Option<String>,
    /// Owning group.
    pub group_id: String,
}

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Reference data for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixture {
    /// Every profile, in server order.
    pub profiles: Vec<Profile>,
    /// Every group, in server order.
    pub groups: Vec<Group>,
    /// Every membership.
    pub memberships: Vec<Membership>,
    /// Rock sample.
    pub rocks: Vec<RockSample>,
    /// Issue sample.
    pub issues: Vec<IssueSample>,
    /// Meeting sample.
    pub meetings: Vec<MeetingSample>,
    /// Quarter sample.
    pub quarters: Vec<QuarterSample>,
    /// Rock idea sample.
    pub rock_ideas: Vec<RockIdeaSample>,
    /// Group ids per user id, in membership order.
    pub user_groups: BTreeMap<String, Vec<String>>,
}

impl Fixture {
    /// Builds the user-to-groups map from the loaded memberships.
    #[must_use]
    pub fn index_memberships(mut self) -> Self {
        let mut user_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for membership in &self.memberships {
            user_groups
                .entry(membership.user_id.clone())
                .or_default()
                .push(membership.group_id.clone());
        }
        self.user_groups = user_groups;
        self
    }

    /// Returns the first profile holding `role`.
    #[must_use]
    pub fn find_user_by_role(&self, role: Role) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.role == role.as_str())
    }

    /// Returns the group ids `user_id` belongs to (empty when none).
    #[must_use]
    pub fn groups_of(&self, user_id: &str) -> &[String] {
        self.user_groups.get(user_id).map_or(&[], Vec::as_slice)
    }

    /// Returns the group ids of `user_id` as a set.
    #[must_use]
    pub fn group_set(&self, user_id: &str) -> BTreeSet<String> {
        self.groups_of(user_id).iter().cloned().collect()
    }

    /// Returns the first group `user_id` is not a member of.
    #[must_use]
    pub fn group_outside(&self, user_id: &str) -> Option<&Group> {
        let own = self.group_set(user_id);
        self.groups.iter().find(|group| !own.contains(&group.id))
    }

    /// Returns the first profile other than `user_id`.
    #[must_use]
    pub fn other_user(&self, user_id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id != user_id)
    }

    /// Returns the first sampled quarter.
    #[must_use]
    pub fn first_quarter(&self) -> Option<&QuarterSample> {
        self.quarters.first()
    }

    /// Returns the first sampled rock outside the groups of `user_id`.
    #[must_use]
    pub fn rock_outside(&self, user_id: &str) -> Option<&RockSample> {
        let own = self.group_set(user_id);
        self.rocks.iter().find(|rock| !own.contains(&rock.group_id))
    }

    /// Returns the first sampled rock idea outside the groups of `user_id`.
    #[must_use]
    pub fn idea_outside(&self, user_id: &str) -> Option<&RockIdeaSample> {
        let own = self.group_set(user_id);
        self.rock_ideas.iter().find(|idea| !own.contains(&idea.group_id))
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Loads the fixture through the admin accessor, emitting one event per
/// resource.
///
/// # Errors
///
/// Returns [`ProbeError`] when any privileged read fails or a row does not
/// carry the fields the harness relies on.
pub fn discover(admin: &AdminClient, sink: &dyn ProgressSink) -> Result<Fixture, ProbeError> {
    sink.emit(&ProgressEvent::DiscoveryStarted);
    let fixture = Fixture {
        profiles: load(admin, sink, "profiles", "id,email,full_name,role", None)?,
        groups: load(admin, sink, "groups", "id,name", None)?,
        memberships: load(admin, sink, "group_members", MEMBERSHIP_COLUMNS, None)?,
        rocks: load(admin, sink, "rocks", ROCK_COLUMNS, Some(ROCK_SAMPLE_LIMIT))?,
        issues: load(admin, sink, "issues", ISSUE_COLUMNS, Some(SAMPLE_LIMIT))?,
        meetings: load(admin, sink, "meetings", "id,meeting_date,group_id", Some(SAMPLE_LIMIT))?,
        quarters: load(admin, sink, "quarters", "id,label,is_current", Some(SAMPLE_LIMIT))?,
        rock_ideas: load(admin, sink, "rock_ideas", IDEA_COLUMNS, Some(SAMPLE_LIMIT))?,
        user_groups: BTreeMap::new(),
    };
    Ok(fixture.index_memberships())
}

/// Reads and decodes one resource.
fn load<T: DeserializeOwned>(
    admin: &AdminClient,
    sink: &dyn ProgressSink,
    resource: &str,
    columns: &str,
    limit: Option<usize>,
) -> Result<Vec<T>, ProbeError> {
    let rows = admin.query(resource, columns, limit)?;
    let records = decode_rows(resource, rows)?;
    sink.emit(&ProgressEvent::Discovered {
        resource: resource.to_string(),
        count: records.len(),
        sample: limit.is_some(),
    });
    Ok(records)
}

/// Decodes open rows into typed records.
///
/// # Errors
///
/// Returns [`ProbeError::Decode`] naming the resource when a row is missing a
/// required field or carries one of the wrong type.
pub fn decode_rows<T: DeserializeOwned>(
    resource: &str,
    rows: Vec<Row>,
) -> Result<Vec<T>, ProbeError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row)).map_err(|err| ProbeError::Decode {
                target: resource.to_string(),
                message: err.to_string(),
            })
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
