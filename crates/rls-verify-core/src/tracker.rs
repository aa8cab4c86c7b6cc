// crates/rls-verify-core/src/tracker.rs
// ============================================================================
// Module: Test Result Tracker
// Description: Explicit pass/fail/skip accumulator threaded through suites.
// Purpose: Replace hidden global counters with an owned, inspectable tracker.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The orchestrator owns one [`ResultTracker`] and lends it mutably to every
//! suite. Recording an outcome updates the counters, appends an immutable
//! [`TestOutcome`], and forwards a [`ProgressEvent`] to the configured sink.
//!
//! ## Invariants
//! - Counters only increase.
//! - Skips never count as passes or failures.
//! - A run is successful exactly when no failure was recorded.

use serde::Serialize;

use crate::events::ProgressEvent;
use crate::events::ProgressSink;
use crate::role::Role;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Verdict of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Assertion held.
    Pass,
    /// Assertion did not hold.
    Fail,
    /// Check could not run for lack of fixture data.
    Skip,
}

/// Recorded outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    /// Verdict.
    pub status: OutcomeStatus,
    /// Check name (or skip reason).
    pub name: String,
    /// Failure detail, when any.
    pub detail: Option<String>,
    /// Role active when the outcome was recorded.
    pub role: Option<Role>,
    /// Suite active when the outcome was recorded.
    pub suite: Option<String>,
}

/// Serializable snapshot of a tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Passed assertions.
    pub passed: u64,
    /// Failed assertions.
    pub failed: u64,
    /// Skipped checks.
    pub skipped: u64,
    /// Formatted failure messages in recording order.
    pub failures: Vec<String>,
    /// Every outcome in recording order.
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    /// Returns passed plus failed.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.passed.saturating_add(self.failed)
    }

    /// Returns true when no assertion failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// SECTION: Tracker
// ============================================================================

/// Pass/fail accumulator for one run.
pub struct ResultTracker<'a> {
    /// Event destination.
    sink: &'a dyn ProgressSink,
    /// Passed assertions.
    passed: u64,
    /// Failed assertions.
    failed: u64,
    /// Skipped checks.
    skipped: u64,
    /// Formatted failure messages.
    failures: Vec<String>,
    /// Every recorded outcome.
    outcomes: Vec<TestOutcome>,
    /// Active role.
    role: Option<Role>,
    /// Active suite label.
    suite: Option<String>,
}

impl<'a> ResultTracker<'a> {
    /// Creates an empty tracker that reports to `sink`.
    #[must_use]
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            passed: 0,
            failed: 0,
            skipped: 0,
            failures: Vec::new(),
            outcomes: Vec::new(),
            role: None,
            suite: None,
        }
    }

    /// Forwards a non-outcome event (discovery, role banners) to the sink.
    pub fn emit(&self, event: &ProgressEvent) {
        self.sink.emit(event);
    }

    /// Returns the sink outcomes are forwarded to.
    #[must_use]
    pub fn sink(&self) -> &'a dyn ProgressSink {
        self.sink
    }

    /// Marks the start of `suite` for `role`; later outcomes carry this scope.
    pub fn begin_suite(&mut self, role: Role, suite: &str) {
        self.role = Some(role);
        self.suite = Some(suite.to_string());
        self.sink.emit(&ProgressEvent::SuiteStarted {
            suite: suite.to_string(),
            role,
        });
    }

    /// Records a passed assertion.
    pub fn record_pass(&mut self, name: &str) {
        self.passed = self.passed.saturating_add(1);
        self.push(OutcomeStatus::Pass, name, None);
        self.sink.emit(&ProgressEvent::Passed {
            name: name.to_string(),
        });
    }

    /// Records a failed assertion with a detail message.
    pub fn record_fail(&mut self, name: &str, detail: &str) {
        self.failed = self.failed.saturating_add(1);
        self.failures.push(failure_message(name, detail));
        let detail = (!detail.is_empty()).then(|| detail.to_string());
        self.push(OutcomeStatus::Fail, name, detail.clone());
        self.sink.emit(&ProgressEvent::Failed {
            name: name.to_string(),
            detail: detail.unwrap_or_default(),
        });
    }

    /// Records a check skipped for lack of fixture data.
    pub fn record_skip(&mut self, reason: &str) {
        self.skipped = self.skipped.saturating_add(1);
        self.push(OutcomeStatus::Skip, reason, None);
        self.sink.emit(&ProgressEvent::Skipped {
            reason: reason.to_string(),
        });
    }

    /// Returns the number of passed assertions.
    #[must_use]
    pub const fn passed(&self) -> u64 {
        self.passed
    }

    /// Returns the number of failed assertions.
    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.failed
    }

    /// Returns the formatted failure messages.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Returns a serializable snapshot.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            failures: self.failures.clone(),
            outcomes: self.outcomes.clone(),
        }
    }

    /// Emits the final tally and returns whether every assertion passed.
    pub fn summarize(&self) -> bool {
        self.sink.emit(&ProgressEvent::Summary {
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            failures: self.failures.clone(),
        });
        self.failed == 0
    }

    /// Appends an outcome with the active scope.
    fn push(&mut self, status: OutcomeStatus, name: &str, detail: Option<String>) {
        self.outcomes.push(TestOutcome {
            status,
            name: name.to_string(),
            detail,
            role: self.role,
            suite: self.suite.clone(),
        });
    }
}

/// Formats a failure message for the summary list.
fn failure_message(name: &str, detail: &str) -> String {
    if detail.is_empty() {
        format!("[FAIL] {name}")
    } else {
        format!("[FAIL] {name} -- {detail}")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
