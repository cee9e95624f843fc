//! Capability classification of micro-step leaves
//!
//! An ordered rule chain maps a leaf description to an automation plan.
//! Rule order is a data structure, not code order: the chain is a static
//! slice walked first-match-wins, with the physical-verb veto in front so
//! a physical task is never classified digital no matter what other
//! keywords it contains.

use tracing::debug;

use crate::domain::{
    AutomationPlan, AutomationStep, ClarificationNeed, DelegationMode, MicroStep, StepClassification,
};

/// What a rule decided for a description
pub enum RuleVerdict {
    /// Force human-only; stop the chain
    Veto,
    /// Automation proposal; stop the chain
    Plan(AutomationPlan),
}

/// One entry in the ordered rule chain
pub struct Rule {
    /// Rule name for logging
    pub name: &'static str,
    /// Applied to the lowercased description; None passes to the next rule
    pub apply: fn(&str) -> Option<RuleVerdict>,
}

/// The ordered rule chain. First match wins.
pub static RULES: &[Rule] = &[
    Rule {
        name: "physical",
        apply: physical_rule,
    },
    Rule {
        name: "iot",
        apply: iot_rule,
    },
    Rule {
        name: "email",
        apply: email_rule,
    },
    Rule {
        name: "calendar",
        apply: calendar_rule,
    },
    Rule {
        name: "research",
        apply: research_rule,
    },
    Rule {
        name: "document",
        apply: document_rule,
    },
    Rule {
        name: "web",
        apply: web_rule,
    },
];

/// Map a leaf description to an automation plan, or None for human-only
pub fn classify(description: &str) -> Option<AutomationPlan> {
    let lowered = description.to_lowercase();

    for rule in RULES {
        match (rule.apply)(&lowered) {
            Some(RuleVerdict::Veto) => {
                debug!(rule = rule.name, "classify: vetoed");
                return None;
            }
            Some(RuleVerdict::Plan(plan)) => {
                debug!(rule = rule.name, confidence = plan.confidence, "classify: matched");
                return Some(plan);
            }
            None => {}
        }
    }

    None
}

/// Map classification confidence to a delegation mode
pub fn delegation_for(plan: Option<&AutomationPlan>) -> DelegationMode {
    match plan {
        None => DelegationMode::Do,
        Some(p) if p.confidence >= 0.8 => DelegationMode::Delegate,
        Some(p) if p.confidence >= 0.5 => DelegationMode::DoWithMe,
        Some(_) => DelegationMode::Do,
    }
}

/// Build clarification needs for the step's missing parameters
pub fn clarifications_for(step: &AutomationStep) -> Vec<ClarificationNeed> {
    let category = step.category().to_string();
    step.missing_params()
        .into_iter()
        .map(|param| {
            let field = format!("{}_{}", category, param);
            let need = ClarificationNeed::new(&field, question_for(&field, param));
            if field == "iot_state" {
                need.with_choices(vec!["on".to_string(), "off".to_string()])
            } else {
                need
            }
        })
        .collect()
}

/// Question text for a prefixed field
fn question_for(field: &str, param: &str) -> String {
    match field {
        "email_to" => "Who should receive this email?".to_string(),
        "email_subject" => "What should the subject line be?".to_string(),
        "calendar_when" => "When should this be scheduled?".to_string(),
        "iot_state" => "Should the device be turned on or off?".to_string(),
        "iot_device" => "Which device should be controlled?".to_string(),
        "web_url" => "Which site should be opened?".to_string(),
        "research_query" => "What exactly should be looked up?".to_string(),
        "document_content" => "What should the document cover?".to_string(),
        _ => format!("Missing value for '{}'", param),
    }
}

/// Run the full classification pass over one leaf
///
/// Sets the automation plan, the digital/human verdict, the delegation
/// mode, and the leaf's clarification needs.
pub fn annotate(step: &mut MicroStep) {
    let plan = classify(&step.description);

    step.classification = if plan.is_some() {
        StepClassification::Digital
    } else {
        StepClassification::Human
    };
    step.delegation = delegation_for(plan.as_ref());
    step.clarifications = plan
        .as_ref()
        .and_then(|p| p.steps.first())
        .map(clarifications_for)
        .unwrap_or_default();
    step.automation = plan;
}

/// Re-derive verdict, delegation, and needs from a leaf's existing plan
///
/// Used after clarification answers patch parameters in place; the plan
/// itself is kept so patched values survive. Leaves without a plan are
/// re-matched from their description.
pub fn reannotate(step: &mut MicroStep) {
    match &step.automation {
        Some(plan) => {
            step.classification = StepClassification::Digital;
            step.delegation = delegation_for(Some(plan));
        }
        None => annotate(step),
    }
}

// ---------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------

/// Verbs that make a step physical regardless of any other keyword
const PHYSICAL_VERBS: &[&str] = &[
    "vacuum", "wash", "drive", "clean", "organize", "carry", "pick up", "put away", "sweep", "mop",
    "fold", "iron", "cook", "mow", "repair",
];

fn physical_rule(description: &str) -> Option<RuleVerdict> {
    PHYSICAL_VERBS
        .iter()
        .any(|verb| description.contains(verb))
        .then_some(RuleVerdict::Veto)
}

const TOGGLE_PHRASES: &[&str] = &["toggle", "turn on", "turn off", "switch"];
const DEVICE_KEYWORDS: &[&str] = &["air conditioner", "lights", "light", "heater", "fan"];

fn iot_rule(description: &str) -> Option<RuleVerdict> {
    let toggled = TOGGLE_PHRASES.iter().any(|p| description.contains(p));
    let device = DEVICE_KEYWORDS.iter().find(|d| description.contains(*d))?;
    if !toggled {
        return None;
    }

    let state = if description.contains("off") { "off" } else { "on" };
    let step = AutomationStep::new("iot.toggle")
        .with_param("device", Some((*device).to_string()))
        .with_param("state", Some(state.to_string()));

    Some(RuleVerdict::Plan(AutomationPlan::single(step, 0.9)))
}

const EMAIL_KEYWORDS: &[&str] = &["email", "send", "draft", "reply", "compose", "forward"];

fn email_rule(description: &str) -> Option<RuleVerdict> {
    if !EMAIL_KEYWORDS.iter().any(|k| description.contains(k)) {
        return None;
    }

    let to = token_after(description, " to ");
    let subject = tail_after_any(description, &["about ", "re: ", "subject: "]);

    let confidence = if to.is_some() && subject.is_some() { 0.7 } else { 0.4 };
    let step = AutomationStep::new("email.send")
        .with_param("to", to)
        .with_param("subject", subject);

    Some(RuleVerdict::Plan(AutomationPlan::single(step, confidence)))
}

const CALENDAR_KEYWORDS: &[&str] = &["schedule", "meeting", "calendar", "book", "appointment"];

fn calendar_rule(description: &str) -> Option<RuleVerdict> {
    if !CALENDAR_KEYWORDS.iter().any(|k| description.contains(k)) {
        return None;
    }

    let when = token_after(description, " at ").or_else(|| token_after(description, "@ "));

    let confidence = if when.is_some() { 0.7 } else { 0.5 };
    let step = AutomationStep::new("calendar.create").with_param("when", when);

    Some(RuleVerdict::Plan(AutomationPlan::single(step, confidence)))
}

const RESEARCH_KEYWORDS: &[&str] = &["research", "look up", "find out", "investigate", "search"];

fn research_rule(description: &str) -> Option<RuleVerdict> {
    let keyword = RESEARCH_KEYWORDS.iter().find(|k| description.contains(*k))?;

    // Query is whatever follows the matched keyword
    let query = description
        .find(*keyword)
        .map(|start| description[start + keyword.len()..].trim().to_string())
        .filter(|tail| !tail.is_empty());
    let step = AutomationStep::new("research.query").with_param("query", query);

    Some(RuleVerdict::Plan(AutomationPlan::single(step, 0.8)))
}

const DOCUMENT_KEYWORDS: &[&str] = &["write", "document", "draft", "notes", "memo", "report"];

fn document_rule(description: &str) -> Option<RuleVerdict> {
    if !DOCUMENT_KEYWORDS.iter().any(|k| description.contains(k)) {
        return None;
    }

    // Content is left for later fill-in
    let step = AutomationStep::new("document.draft").with_param("content", None);

    Some(RuleVerdict::Plan(AutomationPlan::single(step, 0.6)))
}

const WEB_KEYWORDS: &[&str] = &["browse", "web", "website", "visit"];

fn web_rule(description: &str) -> Option<RuleVerdict> {
    if !WEB_KEYWORDS.iter().any(|k| description.contains(k)) {
        return None;
    }

    let url = description
        .split_whitespace()
        .find(|token| token.starts_with("http://") || token.starts_with("https://") || token.starts_with("www."))
        .map(|token| token.trim_end_matches([',', '.', ')']).to_string());

    let confidence = if url.is_some() { 0.7 } else { 0.5 };
    let step = AutomationStep::new("web.browse").with_param("url", url);

    Some(RuleVerdict::Plan(AutomationPlan::single(step, confidence)))
}

// ---------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------

/// Single token following `pattern`, punctuation-trimmed
fn token_after(description: &str, pattern: &str) -> Option<String> {
    let start = description.find(pattern)? + pattern.len();
    let token = description[start..]
        .split_whitespace()
        .next()?
        .trim_end_matches([',', '.', ';', ':'])
        .to_string();
    (!token.is_empty()).then_some(token)
}

/// Remainder of the description after the first matching pattern
fn tail_after_any(description: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        if let Some(start) = description.find(pattern) {
            let tail = description[start + pattern.len()..].trim().to_string();
            if !tail.is_empty() {
                return Some(tail);
            }
        }
    }
    None
}
