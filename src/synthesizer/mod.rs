//! Synthesizer boundary for stepwise
//!
//! The synthesizer is the external AI collaborator that proposes candidate
//! steps. It is a capability: the engine receives `Option<Arc<dyn
//! Synthesizer>>` at construction, and every failure mode falls through to
//! the deterministic rule set in `capture::generator`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod anthropic;
mod error;

pub use anthropic::AnthropicSynthesizer;
pub use error::SynthesizerError;

use crate::config::SynthesizerConfig;
use crate::domain::DelegationMode;

/// What the synthesizer is being asked to produce
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "goal")]
pub enum GenerateGoal {
    /// 3-5 executable micro-steps for a MULTI-scope task
    Steps { min: u8, max: u8 },
    /// 3-5 subtasks for a PROJECT-scope task
    Subtasks { min: u8, max: u8 },
    /// Exactly `count` children at one hierarchy level down
    Children { level: u8, level_name: String, count: u8 },
}

impl GenerateGoal {
    /// Upper bound on accepted candidates for this goal
    pub fn max_candidates(&self) -> usize {
        match self {
            Self::Steps { max, .. } | Self::Subtasks { max, .. } => *max as usize,
            Self::Children { count, .. } => *count as usize,
        }
    }
}

/// A generation request - everything needed for one synthesizer call
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Estimated effort in minutes, when known
    pub estimated_minutes: Option<u32>,

    /// What to produce
    pub goal: GenerateGoal,

    /// Knowledge-graph context summary, when one was fetched
    pub context: Option<String>,
}

/// One candidate step descriptor returned by the synthesizer
///
/// Only the description is required; the generator fills every other
/// missing field with a safe default rather than rejecting the candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepCandidate {
    /// Action description
    pub description: String,

    /// Short display label
    #[serde(default)]
    pub label: Option<String>,

    /// Estimated duration in minutes
    #[serde(default)]
    pub estimated_minutes: Option<u32>,

    /// Suggested delegation mode
    #[serde(default)]
    pub delegation_hint: Option<DelegationMode>,

    /// Display icon
    #[serde(default)]
    pub icon: Option<String>,
}

/// External synthesizer contract
///
/// `generate` returns an ordered sequence of step descriptors or fails.
/// Callers treat every failure uniformly and do not retry the same
/// provider beyond the client's own bounded HTTP retries.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<Vec<StepCandidate>, SynthesizerError>;
}

/// Create a synthesizer based on the provider specified in config
pub fn create_synthesizer(config: &SynthesizerConfig) -> Result<Arc<dyn Synthesizer>, SynthesizerError> {
    debug!(provider = %config.provider, model = %config.model, "create_synthesizer: called");
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicSynthesizer::from_config(config)?)),
        other => Err(SynthesizerError::MalformedOutput(format!(
            "Unknown synthesizer provider: '{}'. Supported: anthropic",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_max_candidates() {
        assert_eq!(GenerateGoal::Steps { min: 3, max: 5 }.max_candidates(), 5);
        assert_eq!(
            GenerateGoal::Children {
                level: 2,
                level_name: "epic".to_string(),
                count: 12
            }
            .max_candidates(),
            12
        );
    }

    #[test]
    fn test_candidate_deserialize_partial() {
        let json = r#"{"description": "Draft the email"}"#;
        let candidate: StepCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.description, "Draft the email");
        assert!(candidate.label.is_none());
        assert!(candidate.estimated_minutes.is_none());
    }

    #[test]
    fn test_candidate_deserialize_full() {
        let json = r#"{
            "description": "Send the email",
            "label": "Send",
            "estimated_minutes": 2,
            "delegation_hint": "delegate",
            "icon": "📧"
        }"#;
        let candidate: StepCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.delegation_hint, Some(DelegationMode::Delegate));
        assert_eq!(candidate.estimated_minutes, Some(2));
    }

    #[test]
    fn test_create_synthesizer_unknown_provider() {
        let config = SynthesizerConfig {
            provider: "gemini".to_string(),
            ..Default::default()
        };
        assert!(create_synthesizer(&config).is_err());
    }
}
