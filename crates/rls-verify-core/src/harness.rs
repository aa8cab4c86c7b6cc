// crates/rls-verify-core/src/harness.rs
// ============================================================================
// Module: Orchestrator
// Description: Discovery, per-role session issuance, and suite sequencing.
// Purpose: Run the selected suites for every selected role, in order.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Harness::run`] discovers the fixture, then walks the roles of the
//! [`RunPlan`] in canonical order. Each role resolves to the first profile
//! holding it; a role with no such profile is skipped and logged. The
//! acting user gets a fresh session and its own [`RestClient`], and the
//! selected suites run one after another against the shared tracker.
//!
//! Discovery, authentication, and transport failures abort the run.

use serde::Serialize;

use crate::admin::AdminClient;
use crate::auth::SessionIssuer;
use crate::client::RestClient;
use crate::discovery::Fixture;
use crate::discovery::discover;
use crate::error::ProbeError;
use crate::events::ProgressEvent;
use crate::events::ProgressSink;
use crate::role::Role;
use crate::suites::Suite;
use crate::suites::SuiteContext;
use crate::tracker::ResultTracker;
use crate::transport::Endpoint;

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Roles and suites selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Roles to test; run in canonical order regardless of listing order.
    pub roles: Vec<Role>,
    /// Suites to run; empty selects every suite.
    pub suites: Vec<Suite>,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            roles: Role::ALL.to_vec(),
            suites: Suite::ALL.to_vec(),
        }
    }
}

impl RunPlan {
    /// Returns the selected roles in canonical order without duplicates.
    #[must_use]
    pub fn ordered_roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|role| self.roles.contains(role)).collect()
    }

    /// Returns the selected suites in canonical order without duplicates.
    #[must_use]
    pub fn ordered_suites(&self) -> Vec<Suite> {
        Suite::ALL
            .into_iter()
            .filter(|suite| self.suites.is_empty() || self.suites.contains(suite))
            .collect()
    }
}

/// Roles actually exercised by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Roles with a representative user, in run order.
    pub roles_tested: Vec<Role>,
    /// Roles skipped because no user holds them.
    pub roles_skipped: Vec<Role>,
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Sequential verification driver.
#[derive(Debug, Clone)]
pub struct Harness {
    /// Target backend.
    endpoint: Endpoint,
    /// Privileged accessor for discovery and compensation.
    admin: AdminClient,
    /// Session minting.
    issuer: SessionIssuer,
}

impl Harness {
    /// Creates a harness for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Transport`] when an HTTP client cannot be built.
    pub fn new(endpoint: Endpoint) -> Result<Self, ProbeError> {
        let admin = AdminClient::new(&endpoint)?;
        let issuer = SessionIssuer::new(&endpoint)?;
        Ok(Self {
            endpoint,
            admin,
            issuer,
        })
    }

    /// Loads the fixture without authenticating any user.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when any privileged read fails.
    pub fn discover(&self, sink: &dyn ProgressSink) -> Result<Fixture, ProbeError> {
        discover(&self.admin, sink)
    }

    /// Runs `plan`, recording every verdict into `tracker` and every role
    /// reached into `outcome`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on discovery, session, transport, or decode
    /// failure. Verdicts and roles recorded before the error are kept.
    pub fn run(
        &self,
        plan: &RunPlan,
        tracker: &mut ResultTracker<'_>,
        outcome: &mut RunOutcome,
    ) -> Result<(), ProbeError> {
        let fixture = self.discover(tracker.sink())?;
        self.run_with_fixture(plan, &fixture, tracker, outcome)
    }

    /// Runs `plan` against an already discovered fixture.
    ///
    /// A role is added to `outcome.roles_tested` once all of its suites
    /// have finished.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on session, transport, or decode failure.
    pub fn run_with_fixture(
        &self,
        plan: &RunPlan,
        fixture: &Fixture,
        tracker: &mut ResultTracker<'_>,
        outcome: &mut RunOutcome,
    ) -> Result<(), ProbeError> {
        let suites = plan.ordered_suites();
        for role in plan.ordered_roles() {
            let Some(user) = fixture.find_user_by_role(role) else {
                tracker.emit(&ProgressEvent::RoleSkipped {
                    role,
                });
                outcome.roles_skipped.push(role);
                continue;
            };
            tracker.emit(&ProgressEvent::RoleStarted {
                role,
                email: user.email.clone(),
                groups: fixture.groups_of(&user.id).to_vec(),
            });
            let session = self.issuer.issue(&user.email)?;
            let client = RestClient::new(&self.endpoint, &session)?;
            let ctx = SuiteContext {
                client: &client,
                admin: &self.admin,
                role,
                user,
                fixture,
            };
            for suite in &suites {
                tracker.begin_suite(role, suite.heading());
                suite.run(&ctx, tracker)?;
            }
            outcome.roles_tested.push(role);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
