//! Capture engine - from free-form task to validated micro-steps
//!
//! This module is the core of stepwise:
//!
//! ```text
//! CaptureRequest → Orchestrator → Decomposer → StepGenerator → leaves
//!                       ↓              ↓             ↑
//!                  Classifier     Scope/Atomic   Synthesizer
//!                       ↓                        (or rule fallback)
//!                  Clarifications
//! ```
//!
//! The recursive decomposer flattens a task into atomic leaves; the
//! hierarchy engine is the alternate progressive-disclosure strategy that
//! splits one level at a time. Every leaf passes through the capability
//! classifier, and the orchestrator's mode decides what happens to the
//! clarification needs that classification surfaces.

pub mod clarify;
pub mod classifier;
mod decomposer;
mod generator;
mod hierarchy;
mod orchestrator;
mod scope;

pub use classifier::{Rule, RuleVerdict, annotate, classify, delegation_for, reannotate};
pub use decomposer::{Decomposer, Decomposition};
pub use generator::{CandidateStep, GeneratedSteps, StepGenerator, StepSource, fallback_phases, fallback_steps};
pub use hierarchy::{
    ExpandOptions, HierarchyChild, HierarchyEngine, HierarchyExpansion, LEVELS, LevelSpec, level_spec,
    quick_classify, target_child_count,
};
pub use orchestrator::{
    CaptureMode, CaptureOrchestrator, CaptureRequest, CaptureResult, ClarificationOutcome,
};
pub use scope::{ATOMIC_MAX_MINUTES, Scope, classify_scope, is_atomic};
