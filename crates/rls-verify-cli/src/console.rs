// crates/rls-verify-cli/src/console.rs
// ============================================================================
// Module: Console Progress Sink
// Description: Renders progress events as human-readable console lines.
// Purpose: Give operators live pass/fail/skip output during a run.
// Dependencies: rls-verify-core
// ============================================================================

//! ## Overview
//! [`ConsoleSink`] turns each [`ProgressEvent`] into zero or more lines via
//! [`render`] and writes them to its output. Write failures are dropped so a
//! closed terminal never aborts a run that is mid-compensation.

use std::io::Write;
use std::sync::Mutex;

use rls_verify_core::ProgressEvent;
use rls_verify_core::ProgressSink;

use crate::t;

/// Separator printed around role banners and the summary.
pub const RULE: &str = "==================================================";

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Sink that writes rendered lines to a console stream.
pub struct ConsoleSink {
    /// Output stream.
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// Creates a sink writing to `out`.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Creates a sink writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: &ProgressEvent) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        for line in render(event) {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders one event as console lines.
#[must_use]
pub fn render(event: &ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::DiscoveryStarted => vec![t!("discover.started"), String::new()],
        ProgressEvent::Discovered {
            resource,
            count,
            sample,
        } => {
            let line = if *sample {
                t!("discover.found_sample", count = count, resource = resource)
            } else {
                t!("discover.found", count = count, resource = resource)
            };
            vec![line]
        }
        ProgressEvent::RoleStarted {
            role,
            email,
            groups,
        } => vec![
            String::new(),
            RULE.to_string(),
            t!("role.banner", email = email, role = role),
            t!("role.groups", groups = join_or_none(groups)),
            RULE.to_string(),
        ],
        ProgressEvent::RoleSkipped {
            role,
        } => vec![String::new(), t!("role.skipped", role = role)],
        ProgressEvent::SuiteStarted {
            suite,
            role,
        } => vec![String::new(), t!("suite.header", suite = suite, role = role)],
        ProgressEvent::Passed {
            name,
        } => vec![t!("result.pass", name = name)],
        ProgressEvent::Failed {
            name,
            detail,
        } => {
            if detail.is_empty() {
                vec![t!("result.fail", name = name)]
            } else {
                vec![t!("result.fail_detail", name = name, detail = detail)]
            }
        }
        ProgressEvent::Skipped {
            reason,
        } => vec![t!("result.skip", reason = reason)],
        ProgressEvent::CleanupFailed {
            resource,
            status,
        } => vec![t!("cleanup.failed", resource = resource, status = status)],
        ProgressEvent::CleanupLeftover {
            resource,
            id,
        } => vec![t!("cleanup.leftover", resource = resource, id = id)],
        ProgressEvent::Summary {
            passed,
            failed,
            skipped,
            failures,
        } => {
            let total = passed.saturating_add(*failed);
            let mut lines = vec![
                String::new(),
                RULE.to_string(),
                t!(
                    "summary.line",
                    passed = passed,
                    total = total,
                    failed = failed,
                    skipped = skipped
                ),
            ];
            if !failures.is_empty() {
                lines.push(String::new());
                lines.push(t!("summary.failures"));
                lines.extend(
                    failures.iter().map(|failure| t!("summary.failure_item", failure = failure)),
                );
            }
            lines
        }
    }
}

/// Joins ids with commas, or the localized `none`.
#[must_use]
pub fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        return t!("list.none");
    }
    items.join(", ")
}
