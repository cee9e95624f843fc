//! Bounded-depth recursive decomposition
//!
//! Flattens a task into an ordered list of atomic micro-steps. Nodes live
//! in an arena and reference each other by index, which keeps depth
//! tracking explicit and avoids self-referential tree objects.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use tracing::{debug, info};

use super::generator::{CandidateStep, StepGenerator};
use super::scope::{Scope, classify_scope, is_atomic};
use crate::config::DecomposeConfig;
use crate::domain::{MicroStep, Task};

/// Result of decomposing one task
#[derive(Debug, Clone, Serialize)]
pub struct Decomposition {
    /// Id of the decomposed task
    pub task_id: String,

    /// Scope the task was classified into
    pub scope: Scope,

    /// Flattened atomic leaves, numbered 1..N
    pub micro_steps: Vec<MicroStep>,

    /// Human-readable outcome summary
    pub message: String,

    /// Number of first-level subtasks, for PROJECT scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask_count: Option<usize>,

    /// Sum of leaf durations, when any leaves exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_estimated_minutes: Option<u32>,
}

/// One node in the decomposition arena
struct Node {
    task: Task,
    #[allow(dead_code)]
    parent: Option<usize>,
    children: Vec<usize>,
    depth: u8,
}

/// Arena of task nodes addressed by index
#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn insert(&mut self, task: Task, parent: Option<usize>, depth: u8) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            task,
            parent,
            children: Vec::new(),
            depth,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id].children.push(id);
        }
        id
    }
}

/// What one expansion pass produced
struct ExpandOutcome {
    leaves: Vec<MicroStep>,
    /// True when this subtree (or one below it) hit the depth limit
    exhausted: bool,
    /// First-level subtask count, set only for PROJECT nodes
    subtask_count: Option<usize>,
}

/// Recursive decomposer composing scope, generation, and atomicity
pub struct Decomposer {
    generator: StepGenerator,
    max_depth: u8,
}

impl Decomposer {
    /// Create a decomposer with the configured depth bound
    pub fn new(generator: StepGenerator, config: &DecomposeConfig) -> Self {
        Self {
            generator,
            max_depth: config.max_depth,
        }
    }

    /// Decompose a task into numbered atomic leaves
    ///
    /// Never fails: synthesizer trouble falls back to rules, and depth
    /// exhaustion is a terminal outcome with an explanatory message.
    pub async fn decompose(&self, task: &Task, context: Option<String>) -> Decomposition {
        info!(task_id = %task.id, title = %task.title, "Decomposing task");

        let scope = classify_scope(task.estimated_hours, &task.description);
        let mut arena = Arena::default();
        let root = arena.insert(task.clone(), None, 0);

        let ExpandOutcome {
            leaves: mut micro_steps,
            exhausted,
            subtask_count,
        } = self.expand(&mut arena, root, 0, context).await;

        for (index, step) in micro_steps.iter_mut().enumerate() {
            step.seq = (index + 1) as u32;
        }

        let total: u32 = micro_steps.iter().map(|s| s.estimated_minutes).sum();
        let message = self.build_message(scope, &micro_steps, exhausted, subtask_count);

        info!(
            task_id = %task.id,
            scope = %scope,
            leaves = micro_steps.len(),
            "Decomposition complete"
        );

        Decomposition {
            task_id: task.id.clone(),
            scope,
            total_estimated_minutes: (!micro_steps.is_empty()).then_some(total),
            micro_steps,
            message,
            subtask_count,
        }
    }

    /// Expand one arena node, recursing into non-atomic children
    fn expand<'a>(
        &'a self,
        arena: &'a mut Arena,
        node: usize,
        depth: u8,
        context: Option<String>,
    ) -> Pin<Box<dyn Future<Output = ExpandOutcome> + Send + 'a>> {
        Box::pin(async move {
            if depth >= self.max_depth {
                debug!(depth, "expand: depth limit reached");
                return ExpandOutcome {
                    leaves: Vec::new(),
                    exhausted: true,
                    subtask_count: None,
                };
            }

            let task = arena.nodes[node].task.clone();
            let scope = classify_scope(task.estimated_hours, &task.description);
            debug!(depth, scope = %scope, title = %task.title, "expand: node");

            match scope {
                Scope::Simple => ExpandOutcome {
                    leaves: vec![self_leaf(&task)],
                    exhausted: false,
                    subtask_count: None,
                },
                Scope::Multi => self.expand_multi(arena, node, &task, depth, context).await,
                Scope::Project => self.expand_project(arena, node, &task, depth, context).await,
            }
        })
    }

    /// MULTI: keep atomic candidates, recurse into compound ones
    async fn expand_multi(
        &self,
        arena: &mut Arena,
        node: usize,
        task: &Task,
        depth: u8,
        context: Option<String>,
    ) -> ExpandOutcome {
        let generated = self.generator.micro_steps(task, context.clone()).await;

        let mut leaves = Vec::new();
        let mut exhausted = false;

        for candidate in generated.steps {
            if is_atomic(candidate.estimated_minutes, &candidate.description) {
                leaves.push(leaf_from_candidate(&candidate));
            } else {
                // Demote the compound candidate back to a task and re-split it
                let child_task = demote(task, &candidate);
                let child = arena.insert(child_task, Some(node), depth + 1);
                let child_outcome = self.expand(arena, child, depth + 1, context.clone()).await;
                exhausted |= child_outcome.exhausted;
                leaves.extend(child_outcome.leaves);
            }
        }

        ExpandOutcome {
            leaves,
            exhausted,
            subtask_count: None,
        }
    }

    /// PROJECT: split into subtasks, recurse into each in order
    async fn expand_project(
        &self,
        arena: &mut Arena,
        node: usize,
        task: &Task,
        depth: u8,
        context: Option<String>,
    ) -> ExpandOutcome {
        let generated = self.generator.subtasks(task, context.clone()).await;
        let subtask_count = generated.steps.len();

        let mut leaves = Vec::new();
        let mut exhausted = false;

        for candidate in generated.steps {
            let child_task = demote(task, &candidate);
            let child = arena.insert(child_task, Some(node), depth + 1);
            let child_outcome = self.expand(arena, child, depth + 1, context.clone()).await;
            exhausted |= child_outcome.exhausted;
            leaves.extend(child_outcome.leaves);
        }

        ExpandOutcome {
            leaves,
            exhausted,
            subtask_count: Some(subtask_count),
        }
    }

    /// Compose the human-readable outcome message
    fn build_message(
        &self,
        scope: Scope,
        steps: &[MicroStep],
        exhausted: bool,
        subtask_count: Option<usize>,
    ) -> String {
        if steps.is_empty() && exhausted {
            return "This task is too complex to break down automatically - try splitting it into \
                    smaller pieces yourself first"
                .to_string();
        }

        let mut message = match scope {
            Scope::Simple => "Small enough to do directly - no breakdown needed".to_string(),
            Scope::Multi => format!("Split into {} steps", steps.len()),
            Scope::Project => format!(
                "Split into {} subtasks covering {} steps",
                subtask_count.unwrap_or(0),
                steps.len()
            ),
        };

        if exhausted {
            message.push_str(" (some branches were too deep to split fully)");
        }

        message
    }
}

/// Leaf representing a Simple task itself
///
/// Duration is min(10, rounded estimate) or 5 without an estimate.
fn self_leaf(task: &Task) -> MicroStep {
    let minutes = task.estimated_minutes().map(|m| m.clamp(1, 10)).unwrap_or(5);
    MicroStep::new(&task.title, &task.title, minutes)
}

/// Build an atomic leaf from a generated candidate
fn leaf_from_candidate(candidate: &CandidateStep) -> MicroStep {
    let mut step = MicroStep::new(&candidate.label, &candidate.description, candidate.estimated_minutes)
        .with_icon(&candidate.icon);
    if let Some(hint) = candidate.delegation_hint {
        step.delegation = hint;
    }
    step
}

/// Demote a compound candidate back to a Task under `parent`
fn demote(parent: &Task, candidate: &CandidateStep) -> Task {
    Task::child_of(parent, &candidate.label, &candidate.description)
        .with_estimate(f64::from(candidate.estimated_minutes) / 60.0)
}
