//! stepwise configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main stepwise configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Synthesizer provider configuration
    pub synthesizer: SynthesizerConfig,

    /// Recursive decomposition limits
    pub decompose: DecomposeConfig,

    /// Hierarchy engine limits
    pub hierarchy: HierarchyConfig,

    /// Knowledge-graph context retrieval
    pub context: ContextConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .stepwise.yml
        let local_config = PathBuf::from(".stepwise.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/stepwise/stepwise.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("stepwise").join("stepwise.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Check whether the synthesizer can be constructed
    pub fn synthesizer_available(&self) -> bool {
        std::env::var(&self.synthesizer.api_key_env).is_ok()
    }
}

/// Synthesizer provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 30_000,
        }
    }
}

/// Recursive decomposition limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposeConfig {
    /// Maximum recursion depth before the terminal "too complex" outcome
    #[serde(rename = "max-depth")]
    pub max_depth: u8,
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        Self { max_depth: 7 }
    }
}

/// Hierarchy engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Durations at or below this many minutes stop splitting
    #[serde(rename = "min-split-minutes")]
    pub min_split_minutes: u32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self { min_split_minutes: 3 }
    }
}

/// Knowledge-graph context retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Whether non-manual captures attempt a context fetch
    pub enabled: bool,

    /// Maximum entities to request per fetch
    #[serde(rename = "max-entities")]
    pub max_entities: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entities: 5,
        }
    }
}
