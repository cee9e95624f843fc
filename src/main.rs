//! stepwise - task capture CLI
//!
//! One-shot entry point: capture, decompose, or expand a task and print
//! the result.

use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use stepwise::capture::{
    CaptureOrchestrator, CaptureRequest, CaptureResult, ExpandOptions, HierarchyEngine, classifier,
};
use stepwise::cli::{Cli, Command, OutputFormat};
use stepwise::config::Config;
use stepwise::domain::{Priority, Task};
use stepwise::synthesizer::{Synthesizer, create_synthesizer};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Capture {
            title,
            description,
            hours,
            priority,
            mode,
            user,
            offline,
            format,
        } => cmd_capture(&config, title, description, hours, priority, mode, user, offline, format).await,
        Command::Decompose {
            title,
            description,
            hours,
            offline,
            format,
        } => cmd_decompose(&config, title, description, hours, offline, format).await,
        Command::Hierarchy {
            title,
            description,
            level,
            minutes,
            max_level,
            force_atomic,
            offline,
            format,
        } => {
            cmd_hierarchy(
                &config,
                title,
                description,
                level,
                minutes,
                max_level,
                force_atomic,
                offline,
                format,
            )
            .await
        }
        Command::Classify { description, format } => cmd_classify(&description, format),
    }
}

/// Build the synthesizer capability, degrading to rules-only with a warning
fn build_synthesizer(config: &Config, offline: bool) -> Option<Arc<dyn Synthesizer>> {
    if offline {
        info!("Offline requested; using deterministic rules only");
        return None;
    }

    if !config.synthesizer_available() {
        warn!(
            "{} not set; falling back to deterministic rules",
            config.synthesizer.api_key_env
        );
        return None;
    }

    match create_synthesizer(&config.synthesizer) {
        Ok(synthesizer) => Some(synthesizer),
        Err(e) => {
            warn!(error = %e, "Could not create synthesizer; falling back to deterministic rules");
            None
        }
    }
}

/// Run a full capture and print the result
#[allow(clippy::too_many_arguments)]
async fn cmd_capture(
    config: &Config,
    title: String,
    description: String,
    hours: Option<f64>,
    priority: Priority,
    mode: stepwise::CaptureMode,
    user: Option<String>,
    offline: bool,
    format: OutputFormat,
) -> Result<()> {
    let synthesizer = build_synthesizer(config, offline);
    let orchestrator = CaptureOrchestrator::new(synthesizer, None, config);

    let request = CaptureRequest {
        title,
        description,
        estimated_hours: hours,
        priority,
        mode,
        user_id: user,
    };

    let result = orchestrator.capture(request).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_capture(&result),
    }

    Ok(())
}

/// Decompose a task and print the numbered steps
async fn cmd_decompose(
    config: &Config,
    title: String,
    description: String,
    hours: Option<f64>,
    offline: bool,
    format: OutputFormat,
) -> Result<()> {
    let synthesizer = build_synthesizer(config, offline);
    let orchestrator = CaptureOrchestrator::new(synthesizer, None, config);

    let mut task = Task::new(&title, &description);
    task.estimated_hours = hours;

    let decomposition = orchestrator.decompose(&task).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decomposition)?),
        OutputFormat::Text => {
            println!("{} {}", "Scope:".bold(), decomposition.scope);
            println!("{}", decomposition.message);
            if let Some(count) = decomposition.subtask_count {
                println!("Subtasks: {}", count);
            }
            for step in &decomposition.micro_steps {
                println!(
                    "  {}. {} {} ({} min)",
                    step.seq,
                    step.icon,
                    step.label,
                    step.estimated_minutes
                );
            }
            if let Some(total) = decomposition.total_estimated_minutes {
                println!("{} {} min", "Total:".bold(), total);
            }
        }
    }

    Ok(())
}

/// Expand a task by one hierarchy level and print the children
#[allow(clippy::too_many_arguments)]
async fn cmd_hierarchy(
    config: &Config,
    title: String,
    description: String,
    level: u8,
    minutes: u32,
    max_level: Option<u8>,
    force_atomic: bool,
    offline: bool,
    format: OutputFormat,
) -> Result<()> {
    let synthesizer = build_synthesizer(config, offline);
    let engine = HierarchyEngine::new(synthesizer, &config.hierarchy);

    let mut task = Task::new(&title, &description);
    task.level = level.min(stepwise::domain::MAX_LEVEL);
    task.estimated_hours = Some(f64::from(minutes) / 60.0);

    let opts = ExpandOptions { max_level, force_atomic };
    let expansion = engine.expand(&mut task, opts).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&expansion)?),
        OutputFormat::Text => {
            println!("{}", expansion.message);
            for child in &expansion.children {
                let minutes = child.task.estimated_minutes().unwrap_or(0);
                let marker = match child.classification {
                    Some(c) => format!(" [{}]", c),
                    None => String::new(),
                };
                println!("  {} {} ({} min){}", child.icon, child.task.title, minutes, marker);
            }
            println!("{} {} min", "Total:".bold(), expansion.total_minutes);
        }
    }

    Ok(())
}

/// Classify one leaf description against the rule chain
fn cmd_classify(description: &str, format: OutputFormat) -> Result<()> {
    let plan = classifier::classify(description);
    let delegation = classifier::delegation_for(plan.as_ref());

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "plan": plan,
                "delegation": delegation,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => match plan {
            Some(plan) => {
                let action = &plan.steps[0];
                println!(
                    "{} {} (confidence {:.1})",
                    "Automatable:".green().bold(),
                    action.kind,
                    plan.confidence
                );
                for (name, value) in &action.params {
                    match value {
                        Some(v) => println!("  {} = {}", name, v),
                        None => println!("  {} = {}", name, "?".yellow()),
                    }
                }
                println!("{} {}", "Delegation:".bold(), delegation);
            }
            None => {
                println!("{}", "Human-only - no automation rule matched".red());
                println!("{} {}", "Delegation:".bold(), delegation);
            }
        },
    }

    Ok(())
}

/// Render a capture result for the terminal
fn print_capture(result: &CaptureResult) {
    println!("{} {}", "Task:".bold(), result.task.title);
    let ready = if result.ready_to_save {
        "yes".green().to_string()
    } else {
        "no".yellow().to_string()
    };
    println!("Mode: {}  Ready to save: {}", result.mode, ready);

    if !result.micro_steps.is_empty() {
        println!("\n{}", "Steps:".bold());
        for step in &result.micro_steps {
            println!(
                "  {}. {} {} ({} min) {} / {}",
                step.seq,
                step.icon,
                step.label,
                step.estimated_minutes,
                step.classification,
                step.delegation
            );
        }
    }

    if !result.clarifications.is_empty() {
        println!("\n{}", "Needs answers:".bold());
        for need in &result.clarifications {
            println!("  - {}: {}", need.field.yellow(), need.question);
        }
    }
}
