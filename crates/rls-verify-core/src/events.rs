// crates/rls-verify-core/src/events.rs
// ============================================================================
// Module: Progress Events
// Description: Structured run events and pluggable sinks.
// Purpose: Stream pass/fail/skip progress without hard-wiring an output format.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every observable step of a run is a [`ProgressEvent`]. Sinks decide where
//! events go: the CLI renders them as console lines, [`JsonLinesSink`]
//! appends them to a file, and [`RecordingSink`] keeps them in memory.

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::role::Role;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One observable step of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Discovery of reference data began.
    DiscoveryStarted,
    /// A reference resource was loaded.
    Discovered {
        /// Resource name.
        resource: String,
        /// Number of rows loaded.
        count: usize,
        /// Whether the load was a bounded sample.
        sample: bool,
    },
    /// A role pass began.
    RoleStarted {
        /// Role under test.
        role: Role,
        /// Email of the acting user.
        email: String,
        /// Group ids the acting user belongs to.
        groups: Vec<String>,
    },
    /// A role was skipped because no user holds it.
    RoleSkipped {
        /// Role without a representative user.
        role: Role,
    },
    /// A suite began for a role.
    SuiteStarted {
        /// Suite label.
        suite: String,
        /// Role under test.
        role: Role,
    },
    /// An assertion passed.
    Passed {
        /// Assertion name.
        name: String,
    },
    /// An assertion failed.
    Failed {
        /// Assertion name.
        name: String,
        /// Failure detail.
        detail: String,
    },
    /// A check was skipped for lack of fixture data.
    Skipped {
        /// Reason the check could not run.
        reason: String,
    },
    /// A compensating write did not succeed; probe data may be orphaned.
    CleanupFailed {
        /// Resource that was being restored.
        resource: String,
        /// Status returned by the compensating call.
        status: u16,
    },
    /// A compensating delete was accepted but the row is still readable.
    CleanupLeftover {
        /// Resource that was being cleaned.
        resource: String,
        /// Id of the row that remains.
        id: String,
    },
    /// Final tally.
    Summary {
        /// Passed assertions.
        passed: u64,
        /// Failed assertions.
        failed: u64,
        /// Skipped checks.
        skipped: u64,
        /// Formatted failure messages.
        failures: Vec<String>,
    },
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Destination for progress events.
pub trait ProgressSink: Send + Sync {
    /// Records one event.
    fn emit(&self, event: &ProgressEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// Recorded events in emission order.
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map_or_else(|_| Vec::new(), |events| events.clone())
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Event line written by [`JsonLinesSink`].
#[derive(Serialize)]
struct TimedEvent<'a> {
    /// Emission time (milliseconds since epoch).
    timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    event: &'a ProgressEvent,
}

/// Append-only JSON Lines sink.
pub struct JsonLinesSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl JsonLinesSink {
    /// Opens `path` in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ProgressSink for JsonLinesSink {
    fn emit(&self, event: &ProgressEvent) {
        let line = TimedEvent {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
            event,
        };
        if let Ok(payload) = serde_json::to_string(&line)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that forwards every event to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    /// Inner sinks.
    sinks: Vec<Box<dyn ProgressSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ProgressSink for FanoutSink {
    fn emit(&self, event: &ProgressEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
