//! Step generation with an AI-or-rules fallback contract
//!
//! The generator asks the synthesizer for candidate steps and falls back
//! to deterministic keyword rules on any failure. The outcome records
//! which path produced the steps so callers can tell "used fallback"
//! from "synthesized" without control-flow exceptions.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{DEFAULT_ICON, DelegationMode, Task};
use crate::synthesizer::{GenerateGoal, GenerateRequest, StepCandidate, Synthesizer};

/// Fully-populated candidate step, ready for the atomicity check
#[derive(Debug, Clone, Serialize)]
pub struct CandidateStep {
    pub description: String,
    pub label: String,
    pub estimated_minutes: u32,
    pub delegation_hint: Option<DelegationMode>,
    pub icon: String,
}

/// Which path produced a batch of candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum StepSource {
    /// The external synthesizer produced the steps
    Synthesized,
    /// The deterministic rule set produced the steps
    Fallback { reason: String },
}

/// Result of one generation call - never an error
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSteps {
    pub steps: Vec<CandidateStep>,
    pub source: StepSource,
}

/// Candidate step generator with deterministic fallback
pub struct StepGenerator {
    synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl StepGenerator {
    /// Create a generator; `None` means rules-only operation
    pub fn new(synthesizer: Option<Arc<dyn Synthesizer>>) -> Self {
        Self { synthesizer }
    }

    /// Generate 3-5 micro-step candidates for a MULTI-scope task
    pub async fn micro_steps(&self, task: &Task, context: Option<String>) -> GeneratedSteps {
        let goal = GenerateGoal::Steps { min: 3, max: 5 };
        match self.try_synthesize(task, context, goal).await {
            Ok(steps) => GeneratedSteps {
                steps,
                source: StepSource::Synthesized,
            },
            Err(reason) => {
                warn!(%reason, task = %task.title, "micro_steps: using deterministic fallback");
                GeneratedSteps {
                    steps: fallback_steps(&task.title, &task.description),
                    source: StepSource::Fallback { reason },
                }
            }
        }
    }

    /// Generate 3-5 subtask candidates for a PROJECT-scope task
    pub async fn subtasks(&self, task: &Task, context: Option<String>) -> GeneratedSteps {
        let goal = GenerateGoal::Subtasks { min: 3, max: 5 };
        match self.try_synthesize(task, context, goal).await {
            Ok(steps) => GeneratedSteps {
                steps,
                source: StepSource::Synthesized,
            },
            Err(reason) => {
                warn!(%reason, task = %task.title, "subtasks: using phase fallback");
                GeneratedSteps {
                    steps: fallback_phases(task.estimated_hours),
                    source: StepSource::Fallback { reason },
                }
            }
        }
    }

    /// Attempt the synthesizer path; any failure becomes a fallback reason
    async fn try_synthesize(
        &self,
        task: &Task,
        context: Option<String>,
        goal: GenerateGoal,
    ) -> Result<Vec<CandidateStep>, String> {
        let synthesizer = self.synthesizer.as_ref().ok_or("no synthesizer configured")?;

        let max = goal.max_candidates();
        let request = GenerateRequest {
            title: task.title.clone(),
            description: task.description.clone(),
            estimated_minutes: task.estimated_minutes(),
            goal,
            context,
        };

        let raw = synthesizer.generate(request).await.map_err(|e| e.to_string())?;

        let steps: Vec<CandidateStep> = raw.into_iter().take(max).filter_map(normalize_candidate).collect();

        if steps.is_empty() {
            return Err("synthesizer returned no usable steps".to_string());
        }

        debug!(count = steps.len(), "try_synthesize: accepted candidates");
        Ok(steps)
    }
}

/// Fill a raw candidate's missing fields with safe defaults
///
/// A candidate without a description carries no information and is
/// dropped; everything else is recoverable.
fn normalize_candidate(raw: StepCandidate) -> Option<CandidateStep> {
    let description = raw.description.trim().to_string();
    if description.is_empty() {
        return None;
    }

    let label = raw
        .label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| short_label(&description));

    Some(CandidateStep {
        label,
        estimated_minutes: raw.estimated_minutes.unwrap_or(5).max(1),
        delegation_hint: raw.delegation_hint,
        icon: raw.icon.filter(|i| !i.trim().is_empty()).unwrap_or_else(|| DEFAULT_ICON.to_string()),
        description,
    })
}

/// Derive a short label from a description (first few words)
fn short_label(description: &str) -> String {
    let words: Vec<&str> = description.split_whitespace().take(4).collect();
    words.join(" ")
}

/// Keyword category for the deterministic rule set
struct FallbackCategory {
    keywords: &'static [&'static str],
    steps: [(&'static str, &'static str, u32, &'static str); 3],
}

/// Rule tables: first matching category wins; the last entry is the
/// keywordless generic catch-all. Every duration sits in [2, 8] minutes.
const FALLBACK_CATEGORIES: &[FallbackCategory] = &[
    FallbackCategory {
        keywords: &["email", "message", "mail", "reply", "send"],
        steps: [
            ("Setup", "Open your email client and find the right thread or address", 2, "📧"),
            ("Draft", "Draft the message body and subject", 5, "✍️"),
            ("Send", "Review the draft and send it", 2, "📤"),
        ],
    },
    FallbackCategory {
        keywords: &["buy", "shopping", "purchase", "order", "shop"],
        steps: [
            ("List items", "Write down exactly what needs to be bought", 3, "📝"),
            ("Place order", "Pick the store or site and place the order", 8, "🛒"),
            ("Confirm", "Check the order confirmation and delivery date", 2, "✅"),
        ],
    },
    FallbackCategory {
        keywords: &["call", "phone", "contact", "dial"],
        steps: [
            ("Find number", "Look up the number and what you need to ask", 2, "🔎"),
            ("Make the call", "Make the call and cover every point", 8, "📞"),
            ("Note outcome", "Write down the outcome and any follow-up", 2, "📝"),
        ],
    },
];

/// Generic steps when no keyword category matches
const GENERIC_STEPS: [(&str, &str, u32, &str); 3] = [
    ("Prepare", "Gather what you need to get started", 3, "🧰"),
    ("Main action", "Do the core of the task", 8, "⚙️"),
    ("Wrap up", "Check the result and tie off loose ends", 3, "🏁"),
];

/// Deterministic 3-step fallback for a MULTI-scope task
///
/// Pure function of the title and description, testable without the
/// synthesizer.
pub fn fallback_steps(title: &str, description: &str) -> Vec<CandidateStep> {
    let haystack = format!("{} {}", title, description).to_lowercase();

    let steps = FALLBACK_CATEGORIES
        .iter()
        .find(|category| category.keywords.iter().any(|k| haystack.contains(k)))
        .map(|category| &category.steps)
        .unwrap_or(&GENERIC_STEPS);

    steps
        .iter()
        .map(|(label, description, minutes, icon)| CandidateStep {
            description: (*description).to_string(),
            label: (*label).to_string(),
            estimated_minutes: *minutes,
            delegation_hint: None,
            icon: (*icon).to_string(),
        })
        .collect()
}

/// Phase weights for the PROJECT fallback, in hours
const PHASE_WEIGHTS: [(&str, f64, &str); 4] = [
    ("Planning & Research", 0.5, "🔍"),
    ("Core Implementation", 1.0, "🔨"),
    ("Testing & Refinement", 0.5, "🧪"),
    ("Completion & Review", 0.25, "🏁"),
];

/// Deterministic 4-phase fallback for a PROJECT-scope task
///
/// The weights are relative: with an estimate present each phase gets its
/// proportional share; without one the raw weights are the durations.
pub fn fallback_phases(estimated_hours: Option<f64>) -> Vec<CandidateStep> {
    let weight_total: f64 = PHASE_WEIGHTS.iter().map(|(_, w, _)| w).sum();
    let scale = estimated_hours.map(|h| h / weight_total).unwrap_or(1.0);

    PHASE_WEIGHTS
        .iter()
        .map(|(name, weight, icon)| CandidateStep {
            description: format!("{} phase", name),
            label: (*name).to_string(),
            estimated_minutes: ((weight * scale * 60.0).round() as u32).max(1),
            delegation_hint: None,
            icon: (*icon).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_email_category() {
        let steps = fallback_steps("Send Email to Client", "Send project update email");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].label, "Setup");
        assert_eq!(steps[1].label, "Draft");
        assert_eq!(steps[2].label, "Send");
        for step in &steps {
            assert!((2..=5).contains(&step.estimated_minutes));
        }
    }

    #[test]
    fn test_fallback_shopping_category() {
        let steps = fallback_steps("Buy groceries", "Order the weekly shopping");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].label, "List items");
        for step in &steps {
            assert!((2..=8).contains(&step.estimated_minutes));
        }
    }

    #[test]
    fn test_fallback_call_category() {
        let steps = fallback_steps("Call the dentist", "");
        assert_eq!(steps[1].label, "Make the call");
    }

    #[test]
    fn test_fallback_generic_category() {
        let steps = fallback_steps("Tidy the garage", "Sort the shelves");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].label, "Prepare");
        for step in &steps {
            assert!((2..=8).contains(&step.estimated_minutes));
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let a = fallback_steps("Send email", "update");
        let b = fallback_steps("Send email", "update");
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.label, y.label);
            assert_eq!(x.estimated_minutes, y.estimated_minutes);
        }
    }

    #[test]
    fn test_fallback_phases_unscaled() {
        let phases = fallback_phases(None);
        assert_eq!(phases.len(), 4);
        assert_eq!(phases[0].label, "Planning & Research");
        assert_eq!(phases[0].estimated_minutes, 30);
        assert_eq!(phases[1].estimated_minutes, 60);
        assert_eq!(phases[3].estimated_minutes, 15);
    }

    #[test]
    fn test_fallback_phases_scaled_to_estimate() {
        let phases = fallback_phases(Some(4.5)); // 2x the weight total
        assert_eq!(phases.len(), 4);
        assert_eq!(phases[0].estimated_minutes, 60);
        assert_eq!(phases[1].estimated_minutes, 120);
        let total: u32 = phases.iter().map(|p| p.estimated_minutes).sum();
        assert_eq!(total, 270);
    }

    #[test]
    fn test_normalize_candidate_fills_defaults() {
        let raw = StepCandidate {
            description: "Draft the quarterly report introduction".to_string(),
            ..Default::default()
        };

        let step = normalize_candidate(raw).unwrap();
        assert_eq!(step.label, "Draft the quarterly report");
        assert_eq!(step.estimated_minutes, 5);
        assert_eq!(step.icon, DEFAULT_ICON);
    }

    #[test]
    fn test_normalize_candidate_drops_empty_description() {
        let raw = StepCandidate {
            description: "   ".to_string(),
            ..Default::default()
        };
        assert!(normalize_candidate(raw).is_none());
    }

    #[tokio::test]
    async fn test_micro_steps_without_synthesizer_uses_fallback() {
        let generator = StepGenerator::new(None);
        let task = Task::new("Send Email to Client", "Send project update email");

        let generated = generator.micro_steps(&task, None).await;
        assert!(matches!(generated.source, StepSource::Fallback { .. }));
        assert_eq!(generated.steps.len(), 3);
    }

    #[tokio::test]
    async fn test_subtasks_without_synthesizer_uses_phases() {
        let generator = StepGenerator::new(None);
        let task = Task::new("Build Enterprise System", "Everything").with_estimate(1000.0);

        let generated = generator.subtasks(&task, None).await;
        assert!(matches!(generated.source, StepSource::Fallback { .. }));
        assert_eq!(generated.steps.len(), 4);
    }
}
