//! Prompt templates for the synthesizer path
//!
//! Templates are compiled in and rendered with Handlebars. The "first
//! step is lowest-effort" instruction is a prompt heuristic only; the
//! engine does not enforce it on the returned ordering.

use eyre::Result;
use handlebars::Handlebars;
use serde::Serialize;

use crate::synthesizer::{GenerateGoal, GenerateRequest};

/// System prompt shared by all generation goals
pub const SYSTEM: &str = r#"You are a task-breakdown assistant. You split a task into concrete,
immediately executable actions sized for a single sitting.

Guidelines:
- Each action must be self-contained and start with a verb
- Put the lowest-effort action first to make starting easy
- Estimate durations honestly; do not pad
- Never invent work the task does not require

Call submit_steps exactly once with all actions.
"#;

/// User prompt for MULTI-scope micro-step generation
const STEPS_TEMPLATE: &str = r#"Break this task into {{goal.min}}-{{goal.max}} micro-steps of 2-15 minutes each.

Task: {{title}}
{{#if description}}Details: {{description}}{{/if}}
{{#if estimated_minutes}}Estimated total: {{estimated_minutes}} minutes{{/if}}
{{#if context}}
Known context:
{{context}}
{{/if}}"#;

/// User prompt for PROJECT-scope subtask generation
const SUBTASKS_TEMPLATE: &str = r#"Break this project into {{goal.min}}-{{goal.max}} sequential subtasks. Each subtask
should be a coherent chunk of work, not a micro-step.

Project: {{title}}
{{#if description}}Details: {{description}}{{/if}}
{{#if estimated_minutes}}Estimated total: {{estimated_minutes}} minutes{{/if}}
{{#if context}}
Known context:
{{context}}
{{/if}}"#;

/// User prompt for hierarchy child generation
const CHILDREN_TEMPLATE: &str = r#"Produce exactly {{goal.count}} children one level below this {{goal.level_name}}
(level {{goal.level}}). Children must jointly cover the parent and not overlap.

Parent: {{title}}
{{#if description}}Details: {{description}}{{/if}}
{{#if estimated_minutes}}Estimated total: {{estimated_minutes}} minutes{{/if}}"#;

/// Render the user prompt for a generation request
pub fn render_request(request: &GenerateRequest) -> Result<String> {
    let template = match request.goal {
        GenerateGoal::Steps { .. } => STEPS_TEMPLATE,
        GenerateGoal::Subtasks { .. } => SUBTASKS_TEMPLATE,
        GenerateGoal::Children { .. } => CHILDREN_TEMPLATE,
    };
    render(template, request)
}

/// Render a template with a serializable context
fn render<T: Serialize>(template: &str, context: &T) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    Ok(handlebars.render_template(template, context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(goal: GenerateGoal) -> GenerateRequest {
        GenerateRequest {
            title: "Send the weekly update".to_string(),
            description: "Email the team a status update".to_string(),
            estimated_minutes: Some(20),
            goal,
            context: None,
        }
    }

    #[test]
    fn test_render_steps() {
        let prompt = render_request(&request(GenerateGoal::Steps { min: 3, max: 5 })).unwrap();
        assert!(prompt.contains("3-5 micro-steps"));
        assert!(prompt.contains("Send the weekly update"));
        assert!(prompt.contains("20 minutes"));
    }

    #[test]
    fn test_render_subtasks() {
        let prompt = render_request(&request(GenerateGoal::Subtasks { min: 3, max: 5 })).unwrap();
        assert!(prompt.contains("sequential subtasks"));
    }

    #[test]
    fn test_render_children() {
        let goal = GenerateGoal::Children {
            level: 2,
            level_name: "epic".to_string(),
            count: 6,
        };
        let prompt = render_request(&request(goal)).unwrap();
        assert!(prompt.contains("exactly 6 children"));
        assert!(prompt.contains("epic"));
    }

    #[test]
    fn test_render_omits_missing_context() {
        let mut req = request(GenerateGoal::Steps { min: 3, max: 5 });
        req.context = None;
        let prompt = render_request(&req).unwrap();
        assert!(!prompt.contains("Known context"));
    }
}
