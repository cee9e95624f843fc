//! Progressive-disclosure hierarchy engine
//!
//! Operates over seven fixed levels, producing only the immediate next
//! level of children per call. This is a separate strategy from the
//! recursive decomposer: callers drill down one level at a time instead
//! of receiving a fully flattened subtree.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::HierarchyConfig;
use crate::domain::{DEFAULT_ICON, DecompositionState, MAX_LEVEL, StepClassification, Task};
use crate::synthesizer::{GenerateGoal, GenerateRequest, Synthesizer};

/// Branching envelope of one hierarchy level
#[derive(Debug, Clone, Copy)]
pub struct LevelSpec {
    pub level: u8,
    pub name: &'static str,
    pub min_children: u32,
    pub max_children: u32,
}

/// The seven levels, initiative down to step. Level 2 ("epic") carries the
/// large-scale fan-out; level 6 never splits.
pub const LEVELS: [LevelSpec; 7] = [
    LevelSpec { level: 0, name: "initiative", min_children: 2, max_children: 6 },
    LevelSpec { level: 1, name: "milestone", min_children: 2, max_children: 6 },
    LevelSpec { level: 2, name: "epic", min_children: 4, max_children: 50 },
    LevelSpec { level: 3, name: "feature", min_children: 2, max_children: 6 },
    LevelSpec { level: 4, name: "story", min_children: 2, max_children: 6 },
    LevelSpec { level: 5, name: "task", min_children: 2, max_children: 6 },
    LevelSpec { level: 6, name: "step", min_children: 0, max_children: 0 },
];

/// Level spec lookup; levels beyond the table saturate at "step"
pub fn level_spec(level: u8) -> &'static LevelSpec {
    &LEVELS[usize::from(level.min(MAX_LEVEL))]
}

/// Target child count for a node from its estimated minutes
///
/// Clamped into the level's branching range. Above two hours an epic
/// scales with size; every other level caps at 6.
pub fn target_child_count(level: u8, minutes: u32) -> u32 {
    let spec = level_spec(level);
    if spec.max_children == 0 {
        return 0;
    }

    let raw = if minutes <= 10 {
        2
    } else if minutes <= 30 {
        3
    } else if minutes <= 120 {
        4
    } else if level == 2 {
        minutes / 60
    } else {
        6
    };

    raw.clamp(spec.min_children, spec.max_children)
}

/// A child produced by one expansion
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyChild {
    #[serde(flatten)]
    pub task: Task,

    /// Display icon
    pub icon: String,

    /// Set when the child was immediately flipped to atomic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<StepClassification>,
}

/// Result of expanding one node by one level
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyExpansion {
    /// Id of the expanded node
    pub task_id: String,

    /// Immediate children, empty when a stop condition held
    pub children: Vec<HierarchyChild>,

    /// Sum of child durations (parent duration when no children)
    pub total_minutes: u32,

    /// Level of the expanded node
    pub level: u8,

    /// Level the children sit at
    pub child_level: u8,

    /// Human-readable outcome summary
    pub message: String,
}

/// Per-call expansion options
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandOptions {
    /// Do not split below this level
    pub max_level: Option<u8>,

    /// Mark the node atomic now instead of splitting it
    pub force_atomic: bool,
}

/// One-level-at-a-time hierarchy splitter
pub struct HierarchyEngine {
    synthesizer: Option<Arc<dyn Synthesizer>>,
    min_split_minutes: u32,
}

impl HierarchyEngine {
    /// Create an engine; `None` synthesizer means equal-split only
    pub fn new(synthesizer: Option<Arc<dyn Synthesizer>>, config: &HierarchyConfig) -> Self {
        Self {
            synthesizer,
            min_split_minutes: config.min_split_minutes,
        }
    }

    /// Expand `task` by exactly one level, updating its lifecycle state
    pub async fn expand(&self, task: &mut Task, opts: ExpandOptions) -> HierarchyExpansion {
        let level = task.level;
        let minutes = task.estimated_minutes().unwrap_or(60);
        let child_level = (level + 1).min(MAX_LEVEL);

        info!(task_id = %task.id, level, minutes, "Expanding hierarchy node");

        if let Some(message) = self.stop_reason(task, minutes, opts) {
            debug!(task_id = %task.id, %message, "expand: stop condition");
            return HierarchyExpansion {
                task_id: task.id.clone(),
                children: Vec::new(),
                total_minutes: minutes,
                level,
                child_level,
                message,
            };
        }

        task.set_state(DecompositionState::Decomposing);

        let count = target_child_count(level, minutes);
        let mut children = self.generate_children(task, minutes, count).await;

        // Children meeting the leaf criteria are classified immediately
        for child in &mut children {
            let child_minutes = child.task.estimated_minutes().unwrap_or(0);
            if child.task.level >= MAX_LEVEL || child_minutes <= self.min_split_minutes {
                child.classification = Some(quick_classify(&child.task.description));
                child.task.set_state(DecompositionState::Atomic);
            }
        }

        task.set_state(DecompositionState::Decomposed);

        let total_minutes: u32 = children
            .iter()
            .map(|c| c.task.estimated_minutes().unwrap_or(0))
            .sum();

        let spec = level_spec(child_level);
        let message = format!("Split into {} {}-level children", children.len(), spec.name);

        HierarchyExpansion {
            task_id: task.id.clone(),
            children,
            total_minutes,
            level,
            child_level,
            message,
        }
    }

    /// First stop condition that applies, if any
    fn stop_reason(&self, task: &Task, minutes: u32, opts: ExpandOptions) -> Option<String> {
        if task.level >= MAX_LEVEL {
            return Some("Already at the step level - nothing finer to split".to_string());
        }
        if opts.force_atomic {
            return Some("Marked atomic on request".to_string());
        }
        if minutes <= self.min_split_minutes {
            return Some(format!("At {} minutes this is already a single action", minutes));
        }
        if let Some(max) = opts.max_level
            && task.level >= max
        {
            return Some(format!("Reached the requested maximum level {}", max));
        }
        None
    }

    /// Generate children via the synthesizer, or equal-split on failure
    async fn generate_children(&self, task: &Task, minutes: u32, count: u32) -> Vec<HierarchyChild> {
        if let Some(synthesizer) = &self.synthesizer {
            let spec = level_spec(task.level);
            let request = GenerateRequest {
                title: task.title.clone(),
                description: task.description.clone(),
                estimated_minutes: Some(minutes),
                goal: GenerateGoal::Children {
                    level: task.level,
                    level_name: spec.name.to_string(),
                    count: count.min(255) as u8,
                },
                context: None,
            };

            match synthesizer.generate(request).await {
                Ok(candidates) => {
                    let share = (minutes / count.max(1)).max(1);
                    let children: Vec<HierarchyChild> = candidates
                        .into_iter()
                        .take(count as usize)
                        .filter(|c| !c.description.trim().is_empty())
                        .map(|candidate| {
                            let label = candidate
                                .label
                                .unwrap_or_else(|| candidate.description.clone());
                            let mut child = Task::child_of(task, label, &candidate.description);
                            let child_minutes = candidate.estimated_minutes.unwrap_or(share).max(1);
                            child.estimated_hours = Some(f64::from(child_minutes) / 60.0);
                            HierarchyChild {
                                task: child,
                                icon: candidate.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
                                classification: None,
                            }
                        })
                        .collect();
                    if !children.is_empty() {
                        return children;
                    }
                    warn!(task_id = %task.id, "generate_children: no usable candidates, equal-splitting");
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "generate_children: synthesizer failed, equal-splitting");
                }
            }
        }

        equal_split_children(task, minutes, count)
    }
}

/// Rule-based fallback: split the duration evenly across generic children
///
/// The first child absorbs the division remainder so the total is
/// preserved.
fn equal_split_children(task: &Task, minutes: u32, count: u32) -> Vec<HierarchyChild> {
    let count = count.max(1);
    let share = (minutes / count).max(1);
    let first_share = minutes.saturating_sub(share * (count - 1)).max(1);

    (0..count)
        .map(|index| {
            let title = format!("{} - part {}/{}", task.title, index + 1, count);
            let mut child = Task::child_of(task, &title, &task.description);
            let child_minutes = if index == 0 { first_share } else { share };
            child.estimated_hours = Some(f64::from(child_minutes) / 60.0);
            HierarchyChild {
                task: child,
                icon: DEFAULT_ICON.to_string(),
                classification: None,
            }
        })
        .collect()
}

/// Keywords marking a description as digitally executable
const DIGITAL_KEYWORDS: &[&str] = &["api", "code", "database", "email", "automated"];

/// Lightweight digital-vs-human heuristic for hierarchy leaves
pub fn quick_classify(description: &str) -> StepClassification {
    let lowered = description.to_lowercase();
    if DIGITAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        StepClassification::Digital
    } else {
        StepClassification::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HierarchyEngine {
        HierarchyEngine::new(None, &HierarchyConfig::default())
    }

    #[test]
    fn test_level_table_shape() {
        assert_eq!(LEVELS.len(), 7);
        assert_eq!(level_spec(2).name, "epic");
        assert_eq!(level_spec(2).max_children, 50);
        assert_eq!(level_spec(6).max_children, 0);
        // Saturates past the table end
        assert_eq!(level_spec(9).name, "step");
    }

    #[test]
    fn test_target_child_count_small_durations() {
        assert_eq!(target_child_count(0, 10), 2);
        assert_eq!(target_child_count(0, 30), 3);
        assert_eq!(target_child_count(0, 120), 4);
        assert_eq!(target_child_count(0, 600), 6);
    }

    #[test]
    fn test_target_child_count_epic_scales_with_size() {
        // 10 hours -> 10 children at the epic level
        assert_eq!(target_child_count(2, 600), 10);
        // Clamped to the epic range max
        assert_eq!(target_child_count(2, 60 * 100), 50);
        // Small epics clamp up to the range min
        assert_eq!(target_child_count(2, 10), 4);
    }

    #[test]
    fn test_target_child_count_leaf_level() {
        assert_eq!(target_child_count(6, 600), 0);
    }

    #[tokio::test]
    async fn test_expand_produces_stub_children() {
        let mut task = Task::new("Quarterly planning", "Plan the quarter").with_estimate(1.0);
        let expansion = engine().expand(&mut task, ExpandOptions::default()).await;

        assert_eq!(expansion.level, 0);
        assert_eq!(expansion.child_level, 1);
        assert_eq!(expansion.children.len(), 4); // 60 minutes -> 4
        assert_eq!(task.state, DecompositionState::Decomposed);
        for child in &expansion.children {
            assert_eq!(child.task.level, 1);
            assert_eq!(child.task.state, DecompositionState::Stub);
            assert!(child.classification.is_none());
        }
    }

    #[tokio::test]
    async fn test_equal_split_preserves_total() {
        let mut task = Task::new("Epic work", "Large epic").with_estimate(1.0);
        task.level = 2;
        let expansion = engine().expand(&mut task, ExpandOptions::default()).await;

        // 60 minutes across 4 epic children (range min)
        assert_eq!(expansion.children.len(), 4);
        assert_eq!(expansion.total_minutes, 60);
    }

    #[tokio::test]
    async fn test_expand_stops_at_step_level() {
        let mut task = Task::new("Tiny", "One action").with_estimate(0.5);
        task.level = 6;
        let expansion = engine().expand(&mut task, ExpandOptions::default()).await;

        assert!(expansion.children.is_empty());
        assert_eq!(task.state, DecompositionState::Stub);
    }

    #[tokio::test]
    async fn test_expand_stops_below_minimum_duration() {
        let mut task = Task::new("Tiny", "One action").with_estimate(0.05); // 3 min
        let expansion = engine().expand(&mut task, ExpandOptions::default()).await;

        assert!(expansion.children.is_empty());
        assert_eq!(expansion.total_minutes, 3);
    }

    #[tokio::test]
    async fn test_expand_force_atomic_stops() {
        let mut task = Task::new("Whatever", "Some work").with_estimate(2.0);
        let opts = ExpandOptions {
            force_atomic: true,
            ..Default::default()
        };
        let expansion = engine().expand(&mut task, opts).await;

        assert!(expansion.children.is_empty());
    }

    #[tokio::test]
    async fn test_expand_respects_max_level() {
        let mut task = Task::new("Story", "A story").with_estimate(2.0);
        task.level = 4;
        let opts = ExpandOptions {
            max_level: Some(4),
            ..Default::default()
        };
        let expansion = engine().expand(&mut task, opts).await;

        assert!(expansion.children.is_empty());
        assert!(expansion.message.contains("maximum level"));
    }

    #[tokio::test]
    async fn test_children_at_step_level_become_atomic() {
        let mut task = Task::new("Migrate database records", "Move the database to the new schema")
            .with_estimate(0.5);
        task.level = 5;
        let expansion = engine().expand(&mut task, ExpandOptions::default()).await;

        assert_eq!(expansion.child_level, 6);
        for child in &expansion.children {
            assert_eq!(child.task.state, DecompositionState::Atomic);
            // Description mentions "database" -> digital
            assert_eq!(child.classification, Some(StepClassification::Digital));
        }
    }

    #[test]
    fn test_quick_classify() {
        assert_eq!(quick_classify("Update the API endpoint"), StepClassification::Digital);
        assert_eq!(quick_classify("Send the email blast"), StepClassification::Digital);
        assert_eq!(quick_classify("Walk to the store"), StepClassification::Human);
    }
}
