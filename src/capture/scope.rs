//! Scope classification and the atomicity predicate
//!
//! Both are pure functions; the decomposer composes them with the step
//! generator to drive recursion.

use serde::{Deserialize, Serialize};

/// Coarse effort classification driving the decomposition strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Doable in one sitting without a breakdown
    Simple,
    /// Needs a handful of micro-steps
    Multi,
    /// Needs subtask-level splitting first
    Project,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Multi => write!(f, "multi"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Leaves at or below this duration are atomic
pub const ATOMIC_MAX_MINUTES: u32 = 15;

/// Descriptions longer than this are never atomic
pub const ATOMIC_MAX_DESCRIPTION_CHARS: usize = 150;

/// Description length below which an estimate-less task is Simple
const SIMPLE_DESCRIPTION_CHARS: usize = 100;

/// Markers that reveal a compound action hiding in one description
const COMPOUND_MARKERS: [&str; 4] = [" then ", " after that", " followed by", "; "];

/// Classify a task's scope from its effort estimate and description
///
/// Without an estimate the description length decides between Simple and
/// Multi. With one, the minute thresholds apply; both boundaries land in
/// the Multi bucket (exactly 15 is Multi, exactly 60 is Multi).
pub fn classify_scope(estimated_hours: Option<f64>, description: &str) -> Scope {
    match estimated_hours {
        None => {
            if description.chars().count() < SIMPLE_DESCRIPTION_CHARS {
                Scope::Simple
            } else {
                Scope::Multi
            }
        }
        Some(hours) => {
            let minutes = hours * 60.0;
            if minutes < 15.0 {
                Scope::Simple
            } else if minutes <= 60.0 {
                Scope::Multi
            } else {
                Scope::Project
            }
        }
    }
}

/// Check whether a candidate step is atomic
///
/// Atomic means: short enough to execute directly, and not secretly a
/// sequence of actions. Failing any condition triggers a recursive
/// re-split of the candidate.
pub fn is_atomic(estimated_minutes: u32, description: &str) -> bool {
    if estimated_minutes > ATOMIC_MAX_MINUTES {
        return false;
    }
    if description.chars().count() > ATOMIC_MAX_DESCRIPTION_CHARS {
        return false;
    }
    let lowered = description.to_lowercase();
    !COMPOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}
