//! Clarification aggregation and answer application
//!
//! Aggregation collects every leaf's information gaps into one ordered,
//! deduplicated sequence. Answer application writes prefixed answers into
//! the matching automation steps' parameter maps in place.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::classifier;
use crate::domain::{ClarificationNeed, MicroStep};

/// Collect and deduplicate clarification needs across all leaves
///
/// Dedupe key is the (field, question) pair; first occurrence order is
/// preserved.
pub fn aggregate(steps: &[MicroStep]) -> Vec<ClarificationNeed> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();

    for step in steps {
        for need in &step.clarifications {
            let key = (need.field.clone(), need.question.clone());
            if seen.insert(key) {
                out.push(need.clone());
            }
        }
    }

    out
}

/// Apply a batch of prefixed clarification answers to the leaves
///
/// An answer key like `email_to` addresses every leaf whose automation
/// step belongs to the `email` category: the stripped parameter name gets
/// the answered value and the leaf's needs are cleared. Afterwards every
/// leaf's verdict and delegation are re-derived from its (now patched)
/// plan.
pub fn apply_answers(steps: &mut [MicroStep], answers: &BTreeMap<String, String>) {
    for (key, value) in answers {
        let Some((category, param)) = key.split_once('_') else {
            debug!(%key, "apply_answers: ignoring unprefixed answer key");
            continue;
        };

        for step in steps.iter_mut() {
            let Some(plan) = step.automation.as_mut() else { continue };
            let Some(action) = plan.steps.first_mut() else { continue };
            if action.category() != category {
                continue;
            }

            debug!(step_id = %step.id, %key, "apply_answers: patching parameter");
            action.params.insert(param.to_string(), Some(value.clone()));
            step.clarifications.clear();
        }
    }

    for step in steps.iter_mut() {
        classifier::reannotate(step);
    }
}
