//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::capture::CaptureMode;
use crate::domain::Priority;

/// stepwise - task capture and decomposition engine
#[derive(Parser)]
#[command(
    name = "sw",
    about = "Break free-form tasks into atomic, automation-annotated micro-steps",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run a full capture: decompose, classify, and aggregate clarifications
    Capture {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Estimated effort in hours
        #[arg(long)]
        hours: Option<f64>,

        /// Priority (low, normal, high, urgent)
        #[arg(short, long, default_value = "normal")]
        priority: Priority,

        /// Capture mode (auto, manual, clarify)
        #[arg(short, long, default_value = "auto")]
        mode: CaptureMode,

        /// User id for knowledge-graph context lookup
        #[arg(long)]
        user: Option<String>,

        /// Skip the synthesizer and use the deterministic rules only
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Decompose a task into numbered micro-steps
    Decompose {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Estimated effort in hours
        #[arg(long)]
        hours: Option<f64>,

        /// Skip the synthesizer and use the deterministic rules only
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Expand a task by one hierarchy level (progressive disclosure)
    Hierarchy {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Hierarchy level of the task (0 = initiative .. 6 = step)
        #[arg(short, long, default_value = "0")]
        level: u8,

        /// Estimated duration in minutes
        #[arg(long, default_value = "60")]
        minutes: u32,

        /// Do not split below this level
        #[arg(long)]
        max_level: Option<u8>,

        /// Mark the node atomic instead of splitting
        #[arg(long)]
        force_atomic: bool,

        /// Skip the synthesizer and use the equal-split fallback only
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Classify a single leaf description against the automation rules
    Classify {
        /// Leaf description
        description: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_capture() {
        let cli = Cli::parse_from(["sw", "capture", "Send email", "--hours", "0.3"]);
        match cli.command {
            Command::Capture { title, hours, mode, .. } => {
                assert_eq!(title, "Send email");
                assert_eq!(hours, Some(0.3));
                assert_eq!(mode, CaptureMode::Auto);
            }
            _ => panic!("Expected capture command"),
        }
    }

    #[test]
    fn test_cli_parse_capture_clarify_mode() {
        let cli = Cli::parse_from(["sw", "capture", "Send email", "--mode", "clarify"]);
        match cli.command {
            Command::Capture { mode, .. } => assert_eq!(mode, CaptureMode::Clarify),
            _ => panic!("Expected capture command"),
        }
    }

    #[test]
    fn test_cli_parse_hierarchy() {
        let cli = Cli::parse_from(["sw", "hierarchy", "Big epic", "--level", "2", "--minutes", "600"]);
        match cli.command {
            Command::Hierarchy { level, minutes, .. } => {
                assert_eq!(level, 2);
                assert_eq!(minutes, 600);
            }
            _ => panic!("Expected hierarchy command"),
        }
    }

    #[test]
    fn test_cli_parse_offline_flag() {
        let cli = Cli::parse_from(["sw", "decompose", "Task", "--offline"]);
        match cli.command {
            Command::Decompose { offline, .. } => assert!(offline),
            _ => panic!("Expected decompose command"),
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
