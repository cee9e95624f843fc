//! stepwise - task capture and decomposition engine
//!
//! stepwise ingests a free-form task description and produces a validated
//! list of atomic, execution-ready micro-steps, each annotated with an
//! automation-feasibility verdict, a delegation recommendation, and any
//! outstanding information gaps.
//!
//! # Core Concepts
//!
//! - **Scope before strategy**: a task is classified Simple, Multi, or
//!   Project, and that classification picks the decomposition path
//! - **Rules behind the AI**: every synthesizer call has a deterministic
//!   keyword fallback, so capture works offline and never fails
//! - **Atomic or split again**: candidate steps that fail the atomicity
//!   predicate are demoted to tasks and recursively re-split, bounded by
//!   depth
//! - **Capabilities injected**: the synthesizer and knowledge-graph
//!   providers are constructor arguments, never globals
//!
//! # Modules
//!
//! - [`capture`] - scope, generation, decomposition, classification, and
//!   the capture orchestrator
//! - [`synthesizer`] - external synthesizer trait and Anthropic client
//! - [`context`] - knowledge-graph context read boundary
//! - [`store`] - persistence collaborator boundary
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod capture;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod prompts;
pub mod store;
pub mod synthesizer;

// Re-export commonly used types
pub use capture::{
    CaptureMode, CaptureOrchestrator, CaptureRequest, CaptureResult, ClarificationOutcome, Decomposition,
    ExpandOptions, HierarchyEngine, HierarchyExpansion, Scope, StepGenerator,
};
pub use config::{Config, SynthesizerConfig};
pub use context::{ContextError, ContextProvider, GraphContext, NullContextProvider};
pub use domain::{
    AutomationPlan, AutomationStep, ClarificationNeed, DecompositionState, DelegationMode, MicroStep,
    Priority, StepClassification, Task,
};
pub use store::{CaptureStore, MemoryStore, StoreError};
pub use synthesizer::{
    AnthropicSynthesizer, GenerateGoal, GenerateRequest, StepCandidate, Synthesizer, SynthesizerError,
    create_synthesizer,
};
