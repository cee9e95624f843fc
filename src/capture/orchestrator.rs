//! Capture orchestration - the top-level mode state machine
//!
//! Assembles the full pipeline: optional context fetch, decomposition,
//! per-leaf classification, and clarification aggregation. The mode is
//! chosen per invocation and never persisted.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::clarify;
use super::classifier;
use super::decomposer::{Decomposer, Decomposition};
use super::generator::StepGenerator;
use super::scope::Scope;
use crate::config::Config;
use crate::context::ContextProvider;
use crate::domain::{ClarificationNeed, DecompositionState, MicroStep, Priority, Task};
use crate::synthesizer::Synthesizer;

/// Capture operating mode, selected by the caller per invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Full pipeline; clarifications are resolved by best guess
    #[default]
    Auto,
    /// Bypass analysis entirely; trust the caller's fields
    Manual,
    /// Full pipeline; clarifications block saving until answered
    Clarify,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
            Self::Clarify => write!(f, "clarify"),
        }
    }
}

impl std::str::FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            "clarify" => Ok(Self::Clarify),
            _ => Err(format!("Unknown capture mode: {}. Use: auto, manual, or clarify", s)),
        }
    }
}

/// Caller-supplied fields for one capture
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub title: String,
    pub description: String,
    pub estimated_hours: Option<f64>,
    pub priority: Priority,
    pub mode: CaptureMode,
    pub user_id: Option<String>,
}

impl CaptureRequest {
    /// Request with defaults for everything but the title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            estimated_hours: None,
            priority: Priority::Normal,
            mode: CaptureMode::Auto,
            user_id: None,
        }
    }
}

/// Result of one capture invocation
#[derive(Debug, Clone, Serialize)]
pub struct CaptureResult {
    pub task: Task,
    pub micro_steps: Vec<MicroStep>,
    pub clarifications: Vec<ClarificationNeed>,
    pub ready_to_save: bool,
    pub mode: CaptureMode,
}

/// Result of applying a batch of clarification answers
#[derive(Debug, Clone, Serialize)]
pub struct ClarificationOutcome {
    pub micro_steps: Vec<MicroStep>,
    pub clarifications: Vec<ClarificationNeed>,
    pub ready_to_save: bool,
}

/// Top-level capture orchestrator
///
/// Capabilities are injected at construction so tests can substitute a
/// deterministic synthesizer or drop it entirely.
pub struct CaptureOrchestrator {
    decomposer: Decomposer,
    context: Option<Arc<dyn ContextProvider>>,
    context_enabled: bool,
    max_context_entities: usize,
}

impl CaptureOrchestrator {
    /// Build the orchestrator from its injected capabilities
    pub fn new(
        synthesizer: Option<Arc<dyn Synthesizer>>,
        context: Option<Arc<dyn ContextProvider>>,
        config: &Config,
    ) -> Self {
        let generator = StepGenerator::new(synthesizer);
        Self {
            decomposer: Decomposer::new(generator, &config.decompose),
            context,
            context_enabled: config.context.enabled,
            max_context_entities: config.context.max_entities,
        }
    }

    /// Run one capture in the requested mode
    ///
    /// Always returns a well-formed result; no pipeline failure is fatal.
    pub async fn capture(&self, request: CaptureRequest) -> CaptureResult {
        info!(title = %request.title, mode = %request.mode, "Capturing task");

        let mut task = Task::new(&request.title, &request.description).with_priority(request.priority);
        task.estimated_hours = request.estimated_hours;

        if request.mode == CaptureMode::Manual {
            // Trust the caller's fields as-is; no analysis, no context
            return CaptureResult {
                task,
                micro_steps: Vec::new(),
                clarifications: Vec::new(),
                ready_to_save: true,
                mode: CaptureMode::Manual,
            };
        }

        let context = self
            .fetch_context(&request.title, &request.description, request.user_id.as_deref())
            .await;

        let decomposition = self.decomposer.decompose(&task, context).await;

        // A Simple task is itself the action - no steps to attach
        let mut micro_steps = if decomposition.scope == Scope::Simple {
            Vec::new()
        } else {
            decomposition.micro_steps
        };

        for step in &mut micro_steps {
            classifier::annotate(step);
        }

        task.set_state(if micro_steps.is_empty() {
            DecompositionState::Atomic
        } else {
            DecompositionState::Decomposed
        });

        let (clarifications, ready_to_save) = match request.mode {
            CaptureMode::Auto => {
                // Best-guess policy: proceed without asking anything
                for step in &mut micro_steps {
                    step.clarifications.clear();
                }
                (Vec::new(), true)
            }
            CaptureMode::Clarify => {
                let aggregated = clarify::aggregate(&micro_steps);
                let ready = aggregated.is_empty();
                (aggregated, ready)
            }
            CaptureMode::Manual => unreachable!("manual mode returned above"),
        };

        CaptureResult {
            task,
            micro_steps,
            clarifications,
            ready_to_save,
            mode: request.mode,
        }
    }

    /// Decompose a task without running the full capture pipeline
    pub async fn decompose(&self, task: &Task) -> Decomposition {
        self.decomposer.decompose(task, None).await
    }

    /// Apply clarification answers and recompute readiness
    pub fn apply_clarifications(
        &self,
        mut micro_steps: Vec<MicroStep>,
        answers: &BTreeMap<String, String>,
    ) -> ClarificationOutcome {
        clarify::apply_answers(&mut micro_steps, answers);

        let clarifications = clarify::aggregate(&micro_steps);
        let ready_to_save = clarifications.is_empty();

        ClarificationOutcome {
            micro_steps,
            clarifications,
            ready_to_save,
        }
    }

    /// Best-effort knowledge-graph fetch; any failure means "no context"
    async fn fetch_context(&self, title: &str, description: &str, user_id: Option<&str>) -> Option<String> {
        if !self.context_enabled {
            return None;
        }
        let provider = self.context.as_ref()?;

        let query = format!("{} {}", title, description);
        let user = user_id.unwrap_or("local");

        match provider.get_context(&query, user, self.max_context_entities).await {
            Ok(context) => context.summary(),
            Err(e) => {
                warn!(error = %e, "Context retrieval failed; continuing without context");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextError, GraphContext};
    use async_trait::async_trait;

    fn orchestrator() -> CaptureOrchestrator {
        CaptureOrchestrator::new(None, None, &Config::default())
    }

    /// Context provider that always fails, for the best-effort path
    struct BrokenContextProvider;

    #[async_trait]
    impl ContextProvider for BrokenContextProvider {
        async fn get_context(&self, _q: &str, _u: &str, _m: usize) -> Result<GraphContext, ContextError> {
            Err(ContextError::Unreachable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_manual_mode_bypasses_analysis() {
        let mut request = CaptureRequest::new("Pay rent");
        request.mode = CaptureMode::Manual;
        request.estimated_hours = Some(5.0);

        let result = orchestrator().capture(request).await;
        assert!(result.ready_to_save);
        assert!(result.micro_steps.is_empty());
        assert!(result.clarifications.is_empty());
        assert_eq!(result.mode, CaptureMode::Manual);
    }

    #[tokio::test]
    async fn test_simple_capture_has_no_steps() {
        let mut request = CaptureRequest::new("Quick check");
        request.description = "Check email".to_string();
        request.estimated_hours = Some(0.01);

        let result = orchestrator().capture(request).await;
        assert!(result.micro_steps.is_empty());
        assert!(result.ready_to_save);
        assert_eq!(result.task.state, DecompositionState::Atomic);
    }

    #[tokio::test]
    async fn test_auto_mode_clears_clarifications() {
        let mut request = CaptureRequest::new("Send Email to Client");
        request.description = "Send project update email".to_string();
        request.estimated_hours = Some(0.3);
        request.mode = CaptureMode::Auto;

        let result = orchestrator().capture(request).await;
        assert!(result.ready_to_save);
        assert!(result.clarifications.is_empty());
        for step in &result.micro_steps {
            assert!(step.clarifications.is_empty());
        }
    }

    #[tokio::test]
    async fn test_clarify_mode_blocks_on_open_needs() {
        let mut request = CaptureRequest::new("Send Email to Client");
        request.description = "Send project update email".to_string();
        request.estimated_hours = Some(0.3);
        request.mode = CaptureMode::Clarify;

        let result = orchestrator().capture(request).await;
        // The email fallback steps classify as email.send with missing params
        assert!(!result.clarifications.is_empty());
        assert!(!result.ready_to_save);
    }

    #[tokio::test]
    async fn test_context_failure_never_aborts_capture() {
        let orchestrator =
            CaptureOrchestrator::new(None, Some(Arc::new(BrokenContextProvider)), &Config::default());

        let mut request = CaptureRequest::new("Send Email to Client");
        request.description = "Send project update email".to_string();
        request.estimated_hours = Some(0.3);

        let result = orchestrator.capture(request).await;
        assert_eq!(result.micro_steps.len(), 3);
    }

    #[tokio::test]
    async fn test_apply_clarifications_recomputes_readiness() {
        let mut request = CaptureRequest::new("Send Email to Client");
        request.description = "Send project update email".to_string();
        request.estimated_hours = Some(0.3);
        request.mode = CaptureMode::Clarify;

        let orchestrator = orchestrator();
        let result = orchestrator.capture(request).await;
        assert!(!result.ready_to_save);

        let mut answers = BTreeMap::new();
        for need in &result.clarifications {
            answers.insert(need.field.clone(), "answered".to_string());
        }

        let outcome = orchestrator.apply_clarifications(result.micro_steps, &answers);
        assert!(outcome.ready_to_save);
        assert!(outcome.clarifications.is_empty());
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("auto".parse::<CaptureMode>().unwrap(), CaptureMode::Auto);
        assert_eq!("CLARIFY".parse::<CaptureMode>().unwrap(), CaptureMode::Clarify);
        assert!("other".parse::<CaptureMode>().is_err());
        assert_eq!(CaptureMode::Manual.to_string(), "manual");
    }
}
