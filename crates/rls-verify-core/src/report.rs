// crates/rls-verify-core/src/report.rs
// ============================================================================
// Module: Run Report
// Description: Deterministic run summaries written as JSON and Markdown.
// Purpose: Leave an auditable record of every verdict in a run.
// Dependencies: serde, serde_jcs, time
// ============================================================================

//! ## Overview
//! A [`RunReport`] combines the tracker snapshot with run timing and the
//! roles that were exercised. [`RunReport::write`] emits `summary.json`
//! (canonical JCS serialization) and `summary.md` into a directory.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::ProbeError;
use crate::harness::RunOutcome;
use crate::role::Role;
use crate::tracker::OutcomeStatus;
use crate::tracker::RunSummary;
use crate::tracker::TestOutcome;

/// File name of the JSON summary.
pub const SUMMARY_JSON: &str = "summary.json";
/// File name of the Markdown summary.
pub const SUMMARY_MD: &str = "summary.md";

// ============================================================================
// SECTION: Report
// ============================================================================

/// Summary of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Run start (RFC 3339).
    pub started_at: String,
    /// Run end (RFC 3339).
    pub ended_at: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// True when no assertion failed and the run was not aborted.
    pub success: bool,
    /// Passed assertions.
    pub passed: u64,
    /// Failed assertions.
    pub failed: u64,
    /// Skipped checks.
    pub skipped: u64,
    /// Roles with a representative user.
    pub roles_tested: Vec<Role>,
    /// Roles without a representative user.
    pub roles_skipped: Vec<Role>,
    /// Formatted failure messages.
    pub failures: Vec<String>,
    /// Fatal error that aborted the run, if any.
    pub aborted: Option<String>,
    /// Every outcome in recording order.
    pub outcomes: Vec<TestOutcome>,
}

impl RunReport {
    /// Builds a report from a tracker snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Report`] when a timestamp cannot be formatted.
    pub fn new(
        started: OffsetDateTime,
        ended: OffsetDateTime,
        summary: RunSummary,
        outcome: &RunOutcome,
    ) -> Result<Self, ProbeError> {
        let millis = (ended - started).whole_milliseconds().max(0);
        Ok(Self {
            started_at: rfc3339(started)?,
            ended_at: rfc3339(ended)?,
            duration_ms: u64::try_from(millis).unwrap_or(u64::MAX),
            success: summary.is_success(),
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            roles_tested: outcome.roles_tested.clone(),
            roles_skipped: outcome.roles_skipped.clone(),
            failures: summary.failures,
            aborted: None,
            outcomes: summary.outcomes,
        })
    }

    /// Marks the run as aborted by a fatal error.
    #[must_use]
    pub fn aborted(mut self, reason: impl Into<String>) -> Self {
        self.aborted = Some(reason.into());
        self.success = false;
        self
    }

    /// Writes `summary.json` and `summary.md` into `dir`, creating it.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Report`] when serialization or a write fails.
    pub fn write(&self, dir: &Path) -> Result<(), ProbeError> {
        fs::create_dir_all(dir)
            .map_err(|err| ProbeError::Report(format!("{}: {err}", dir.display())))?;
        let bytes = serde_jcs::to_vec(self).map_err(|err| ProbeError::Report(err.to_string()))?;
        write_file(&dir.join(SUMMARY_JSON), &bytes)?;
        write_file(&dir.join(SUMMARY_MD), self.to_markdown().as_bytes())
    }

    /// Renders the Markdown summary.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# RLS Verification Summary\n\n");
        out.push_str("## Status\n\n");
        let status = if self.success { "passed" } else { "failed" };
        let _ = writeln!(out, "- Result: {status}");
        let _ = writeln!(out, "- Started: {}", self.started_at);
        let _ = writeln!(out, "- Ended: {}", self.ended_at);
        let _ = writeln!(out, "- Duration: {} ms", self.duration_ms);
        let _ = writeln!(
            out,
            "- Assertions: {}/{} passed, {} failed, {} skipped",
            self.passed,
            self.passed.saturating_add(self.failed),
            self.failed,
            self.skipped
        );
        let _ = writeln!(out, "- Roles tested: {}", join_roles(&self.roles_tested));
        let _ = writeln!(out, "- Roles skipped: {}", join_roles(&self.roles_skipped));
        if let Some(reason) = &self.aborted {
            let _ = writeln!(out, "- Aborted: {reason}");
        }

        out.push_str("\n## Failures\n\n");
        if self.failures.is_empty() {
            out.push_str("None.\n");
        }
        for failure in &self.failures {
            let _ = writeln!(out, "- `{failure}`");
        }

        out.push_str("\n## Outcomes\n\n");
        out.push_str("| Role | Suite | Status | Check |\n|---|---|---|---|\n");
        for outcome in &self.outcomes {
            let role = outcome.role.map_or("-", Role::as_str);
            let suite = outcome.suite.as_deref().unwrap_or("-");
            let status = match outcome.status {
                OutcomeStatus::Pass => "pass",
                OutcomeStatus::Fail => "FAIL",
                OutcomeStatus::Skip => "skip",
            };
            let name = escape_cell(&outcome.name);
            let _ = writeln!(out, "| {role} | {suite} | {status} | {name} |");
        }
        out
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a timestamp as RFC 3339.
fn rfc3339(value: OffsetDateTime) -> Result<String, ProbeError> {
    value.format(&Rfc3339).map_err(|err| ProbeError::Report(err.to_string()))
}

/// Writes one artifact.
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ProbeError> {
    fs::write(path, bytes).map_err(|err| ProbeError::Report(format!("{}: {err}", path.display())))
}

/// Joins role labels, or `none`.
fn join_roles(roles: &[Role]) -> String {
    if roles.is_empty() {
        return "none".to_string();
    }
    roles.iter().map(|role| role.as_str()).collect::<Vec<_>>().join(", ")
}

/// Escapes pipes so a check name stays in one table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
