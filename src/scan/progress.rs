//! Progress reporting: phase changes and per-container counters delivered
//! to a caller-supplied callback on the aggregating thread.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a scan is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    Discovering,
    Analyzing,
    Resolving,
    Done,
    Failed,
}

impl ScanPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::Done | ScanPhase::Failed)
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Discovering => "discovering",
            ScanPhase::Analyzing => "analyzing",
            ScanPhase::Resolving => "resolving",
            ScanPhase::Done => "done",
            ScanPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One progress event. `completed` never decreases within a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub phase: ScanPhase,
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

impl ScanProgress {
    pub fn new(phase: ScanPhase, completed: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            phase,
            completed,
            total,
            message: message.into(),
        }
    }

    /// Completed share in `0.0..=1.0`; an empty phase counts as finished.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Shared flag a caller flips to stop a running scan between containers
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}
