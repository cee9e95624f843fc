//! Domain types for stepwise
//!
//! Core domain types: Task, MicroStep, AutomationPlan, ClarificationNeed.
//! Tasks are containers that may be split further; MicroSteps are the
//! atomic leaves a capture produces.

mod id;
mod step;
mod task;

pub use id::{generate_id, now_ms};
pub use step::{
    AutomationPlan, AutomationStep, ClarificationNeed, DEFAULT_ICON, DelegationMode, MicroStep,
    StepClassification,
};
pub use task::{DecompositionState, MAX_LEVEL, Priority, Task};
