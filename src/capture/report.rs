//! Capture results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Non-fatal condition that degraded a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureWarning {
    /// No scrollable region; one static pass was made
    NoScrollRegion,
    /// The step ceiling stopped the loop before the end was reached
    StepCeilingReached {
        /// Steps taken
        steps: u32,
    },
}

impl fmt::Display for CaptureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureWarning::NoScrollRegion => {
                write!(f, "no scrollable region found; captured visible content only")
            },
            CaptureWarning::StepCeilingReached { steps } => {
                write!(f, "stopped after {} steps; capture may be incomplete", steps)
            },
        }
    }
}

/// Counters collected during a capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStats {
    /// Advancing steps taken
    pub steps: u32,
    /// Extraction passes made
    pub passes: u32,
    /// Units in the final document
    pub units: usize,
    /// Distinct units dropped by conversion failures
    pub dropped_units: usize,
}

/// Result of a successful capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReport {
    /// Identifier of the session that produced the text
    pub session_id: Uuid,
    /// Assembled Markdown
    pub text: String,
    /// Degradation warnings
    pub warnings: Vec<CaptureWarning>,
    /// Counters
    pub stats: CaptureStats,
    /// Completion time
    pub captured_at: DateTime<Utc>,
}

impl CaptureReport {
    /// Whether the result was degraded.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
