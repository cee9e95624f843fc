//! MicroStep domain type and its automation annotations
//!
//! A MicroStep is an atomic, execution-ready action. Once atomic it is
//! never split further; numbering is reassigned after flattening.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Whether a leaf can be executed without a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepClassification {
    /// An automation plan exists
    Digital,
    /// Requires human action
    Human,
    /// Not yet classified
    #[default]
    Unknown,
}

impl std::fmt::Display for StepClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Digital => write!(f, "digital"),
            Self::Human => write!(f, "human"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Recommended execution owner for a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DelegationMode {
    /// User executes the step themselves
    #[default]
    Do,
    /// Assisted execution, user stays in the loop
    DoWithMe,
    /// Fully delegated to automation
    Delegate,
}

impl std::fmt::Display for DelegationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Do => write!(f, "do"),
            Self::DoWithMe => write!(f, "do_with_me"),
            Self::Delegate => write!(f, "delegate"),
        }
    }
}

/// One automatable action within a plan
///
/// Parameter values may be absent pending clarification; an applied
/// clarification answer writes the value in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationStep {
    /// Action family tag, e.g. "email.send"
    pub kind: String,

    /// Parameter name -> value; None means required-but-missing
    pub params: BTreeMap<String, Option<String>>,
}

impl AutomationStep {
    /// Create a step with no parameters
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter, present or pending
    pub fn with_param(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Parameter names that still have no value
    pub fn missing_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Category of the action family: "email.send" -> "email"
    pub fn category(&self) -> &str {
        self.kind.split('.').next().unwrap_or(&self.kind)
    }
}

/// A proposed way to execute a leaf without a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationPlan {
    /// Ordered automatable actions (classification emits exactly one)
    pub steps: Vec<AutomationStep>,

    /// Classifier confidence in [0, 1]
    pub confidence: f64,
}

impl AutomationPlan {
    /// Create a single-step plan
    pub fn single(step: AutomationStep, confidence: f64) -> Self {
        Self {
            steps: vec![step],
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// An unresolved information gap blocking execution of a leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationNeed {
    /// Prefixed field identifier, e.g. "email_to"
    pub field: String,

    /// Question to ask the user
    pub question: String,

    /// Offered choices, when the answer space is closed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl ClarificationNeed {
    /// Create an open-ended need
    pub fn new(field: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            question: question.into(),
            choices: Vec::new(),
        }
    }

    /// Builder-style closed answer set
    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }
}

/// Atomic, executable action produced by decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroStep {
    /// Unique identifier (e.g., "01943a-step-draft-the-email")
    pub id: String,

    /// Sequence number, 1-based and contiguous after flattening
    pub seq: u32,

    /// Short label for list display
    pub label: String,

    /// Full action description
    pub description: String,

    /// Estimated duration in minutes
    pub estimated_minutes: u32,

    /// Display icon (emoji)
    pub icon: String,

    /// Automation-feasibility verdict
    pub classification: StepClassification,

    /// Recommended execution owner
    pub delegation: DelegationMode,

    /// Automation plan when the step is digital
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation: Option<AutomationPlan>,

    /// Outstanding information gaps, ordered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clarifications: Vec<ClarificationNeed>,
}

impl MicroStep {
    /// Create an unclassified step
    pub fn new(label: impl Into<String>, description: impl Into<String>, estimated_minutes: u32) -> Self {
        let label = label.into();
        Self {
            id: generate_id("step", &label),
            seq: 0,
            label,
            description: description.into(),
            estimated_minutes,
            icon: DEFAULT_ICON.to_string(),
            classification: StepClassification::Unknown,
            delegation: DelegationMode::Do,
            automation: None,
            clarifications: Vec::new(),
        }
    }

    /// Builder-style icon
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// First automation step of the plan, if any
    pub fn automation_step(&self) -> Option<&AutomationStep> {
        self.automation.as_ref().and_then(|p| p.steps.first())
    }
}

/// Icon used when neither the synthesizer nor a rule supplies one
pub const DEFAULT_ICON: &str = "✅";
