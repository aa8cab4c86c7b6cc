// crates/rls-verify-core/src/role.rs
// ============================================================================
// Module: Caller Roles
// Description: Closed set of application roles exercised by the harness.
// Purpose: Classify callers into restricted, elevated, and administrative tiers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Profiles carry a role string. Only the three known roles are ever selected
//! for a test pass; unknown strings are kept as text in the fixture and
//! ignored by the orchestrator.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Application role held by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Restricted team member scoped to its own groups.
    TeamMember,
    /// Elevated reader with cross-group visibility and no admin writes.
    Executive,
    /// Administrator that bypasses group scoping.
    SystemAdmin,
}

impl Role {
    /// Canonical test-plan order: restricted, elevated, administrative.
    pub const ALL: [Self; 3] = [Self::TeamMember, Self::Executive, Self::SystemAdmin];

    /// Returns the wire label stored in `profiles.role`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TeamMember => "team_member",
            Self::Executive => "executive",
            Self::SystemAdmin => "system_admin",
        }
    }

    /// Returns true for the role whose reads are scoped to its memberships.
    #[must_use]
    pub const fn is_restricted(self) -> bool {
        matches!(self, Self::TeamMember)
    }

    /// Returns true for the administrative role.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::SystemAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
