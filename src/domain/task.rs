//! Task domain type
//!
//! A Task is a unit of work that may still be a container for further
//! splitting. Recursive decomposition replaces a compound Task with its
//! micro-step leaves; the hierarchy engine splits one level at a time.

use serde::{Deserialize, Serialize};

use super::id::{generate_id, now_ms};

/// Deepest level in the progressive-disclosure hierarchy (0 = initiative)
pub const MAX_LEVEL: u8 = 6;

/// Lifecycle marker of a Task node during decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionState {
    /// Created but not yet examined
    #[default]
    Stub,
    /// Children are being generated
    Decomposing,
    /// Children exist; this node is a container
    Decomposed,
    /// Leaf condition met; never split further
    Atomic,
}

impl std::fmt::Display for DecompositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stub => write!(f, "stub"),
            Self::Decomposing => write!(f, "decomposing"),
            Self::Decomposed => write!(f, "decomposed"),
            Self::Atomic => write!(f, "atomic"),
        }
    }
}

/// Priority for persistence ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A Task is a unit of work, possibly a container for further splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "019430-task-book-flights")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Free-form description of the work
    pub description: String,

    /// Estimated effort in hours, when the caller supplied one
    pub estimated_hours: Option<f64>,

    /// Priority for persistence ordering
    pub priority: Priority,

    /// Hierarchy level, 0 (initiative) through 6 (step)
    pub level: u8,

    /// Parent task ID when this node was created by expansion
    pub parent: Option<String>,

    /// Owning project ID, inherited by demoted subtasks
    pub project: Option<String>,

    /// Decomposition lifecycle marker
    pub state: DecompositionState,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Task {
    /// Create a new top-level Task with generated ID
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let title = title.into();
        let now = now_ms();
        Self {
            id: generate_id("task", &title),
            title,
            description: description.into(),
            estimated_hours: None,
            priority: Priority::Normal,
            level: 0,
            parent: None,
            project: None,
            state: DecompositionState::Stub,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a child Task produced by expanding `parent`
    pub fn child_of(parent: &Task, title: impl Into<String>, description: impl Into<String>) -> Self {
        let mut task = Self::new(title, description);
        task.level = (parent.level + 1).min(MAX_LEVEL);
        task.parent = Some(parent.id.clone());
        task.project = parent.project.clone();
        task.priority = parent.priority;
        task
    }

    /// Builder-style estimate in hours
    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Builder-style priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Estimated effort in whole minutes, when an estimate exists
    pub fn estimated_minutes(&self) -> Option<u32> {
        self.estimated_hours.map(|h| (h * 60.0).round().max(0.0) as u32)
    }

    /// Update the decomposition state
    pub fn set_state(&mut self, state: DecompositionState) {
        self.state = state;
        self.updated_at = now_ms();
    }

    /// Check whether this node may still be split
    pub fn is_splittable(&self) -> bool {
        self.state != DecompositionState::Atomic && self.level < MAX_LEVEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_new() {
        let task = Task::new("Book flights", "Book flights to Tokyo for June");
        assert!(task.id.contains("-task-"));
        assert_eq!(task.level, 0);
        assert_eq!(task.state, DecompositionState::Stub);
        assert!(task.estimated_hours.is_none());
        assert!(task.parent.is_none());
    }

    #[test]
    fn test_task_child_of() {
        let mut parent = Task::new("Trip", "Plan the trip").with_priority(Priority::High);
        parent.project = Some("proj-1".to_string());
        let child = Task::child_of(&parent, "Flights", "Book the flights");

        assert_eq!(child.parent.as_deref(), Some(parent.id.as_str()));
        assert_eq!(child.level, 1);
        assert_eq!(child.priority, Priority::High);
        assert_eq!(child.project.as_deref(), Some("proj-1"));
    }

    #[test]
    fn test_child_level_capped() {
        let mut parent = Task::new("Deep", "d");
        parent.level = MAX_LEVEL;
        let child = Task::child_of(&parent, "Deeper", "d");
        assert_eq!(child.level, MAX_LEVEL);
    }

    #[test]
    fn test_estimated_minutes() {
        let task = Task::new("T", "d").with_estimate(0.5);
        assert_eq!(task.estimated_minutes(), Some(30));

        let task = Task::new("T", "d").with_estimate(0.01);
        assert_eq!(task.estimated_minutes(), Some(1));

        let task = Task::new("T", "d");
        assert_eq!(task.estimated_minutes(), None);
    }

    #[test]
    fn test_is_splittable() {
        let mut task = Task::new("T", "d");
        assert!(task.is_splittable());

        task.set_state(DecompositionState::Atomic);
        assert!(!task.is_splittable());

        let mut leaf = Task::new("T", "d");
        leaf.level = MAX_LEVEL;
        assert!(!leaf.is_splittable());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("invalid".parse::<Priority>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&DecompositionState::Decomposed).unwrap();
        assert_eq!(json, "\"decomposed\"");
    }

    #[test]
    fn test_task_serde_roundtrip() {
        let task = Task::new("Send email", "Send the weekly update").with_estimate(0.3);
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task.id, back.id);
        assert_eq!(back.estimated_hours, Some(0.3));
    }
}
