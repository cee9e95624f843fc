//! Anthropic-backed synthesizer implementation
//!
//! Calls the Messages API with a single forced tool (`submit_steps`) so
//! the step descriptors come back as structured JSON rather than prose.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{GenerateRequest, StepCandidate, Synthesizer, SynthesizerError};
use crate::config::SynthesizerConfig;
use crate::prompts;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Anthropic Messages API synthesizer
pub struct AnthropicSynthesizer {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicSynthesizer {
    /// Create a synthesizer from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &SynthesizerConfig) -> Result<Self, SynthesizerError> {
        debug!(model = %config.model, "from_config: called");
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SynthesizerError::MalformedOutput(format!("API key not found in ${}", config.api_key_env))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(SynthesizerError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Messages API
    fn build_request_body(&self, request: &GenerateRequest) -> Result<serde_json::Value, SynthesizerError> {
        let user_prompt = prompts::render_request(request)
            .map_err(|e| SynthesizerError::MalformedOutput(e.to_string()))?;

        Ok(serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": prompts::SYSTEM,
            "messages": [{ "role": "user", "content": user_prompt }],
            "tools": [submit_steps_tool()],
            "tool_choice": { "type": "tool", "name": "submit_steps" },
        }))
    }

    /// Parse the API response into candidates
    fn parse_response(&self, api_response: ApiResponse) -> Result<Vec<StepCandidate>, SynthesizerError> {
        for block in api_response.content {
            if let ContentBlock::ToolUse { name, input } = block
                && name == "submit_steps"
            {
                return parse_submission(&input);
            }
        }

        Err(SynthesizerError::MalformedOutput(
            "No submit_steps tool call in response".to_string(),
        ))
    }
}

/// Parse the submit_steps tool input into candidates
fn parse_submission(input: &serde_json::Value) -> Result<Vec<StepCandidate>, SynthesizerError> {
    let steps = input
        .get("steps")
        .ok_or_else(|| SynthesizerError::MalformedOutput("Missing 'steps' in submission".to_string()))?;

    let candidates: Vec<StepCandidate> = serde_json::from_value(steps.clone())?;

    if candidates.is_empty() {
        return Err(SynthesizerError::MalformedOutput(
            "Submission contained zero steps".to_string(),
        ));
    }

    Ok(candidates)
}

/// Tool schema the model must call with its step list
fn submit_steps_tool() -> serde_json::Value {
    serde_json::json!({
        "name": "submit_steps",
        "description": "Submit the ordered list of actions. Call this once with all of them.",
        "input_schema": {
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "description": {
                                "type": "string",
                                "description": "Self-contained action description"
                            },
                            "label": {
                                "type": "string",
                                "description": "Short display label (2-4 words)"
                            },
                            "estimated_minutes": {
                                "type": "integer",
                                "description": "Estimated duration in minutes"
                            },
                            "delegation_hint": {
                                "type": "string",
                                "enum": ["do", "do_with_me", "delegate"],
                                "description": "Suggested execution owner"
                            },
                            "icon": {
                                "type": "string",
                                "description": "Single emoji for display"
                            }
                        },
                        "required": ["description"]
                    }
                }
            },
            "required": ["steps"]
        }
    })
}

#[async_trait]
impl Synthesizer for AnthropicSynthesizer {
    async fn generate(&self, request: GenerateRequest) -> Result<Vec<StepCandidate>, SynthesizerError> {
        debug!(model = %self.model, goal = ?request.goal, "generate: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(&request)?;

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, "generate: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .post(url.clone())
                .header("x-api-key", self.api_key.clone())
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "generate: network error");
                    last_error = Some(SynthesizerError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);

                return Err(SynthesizerError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "generate: retryable error");
                last_error = Some(SynthesizerError::ApiError { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(SynthesizerError::ApiError { status, message: text });
            }

            let api_response: ApiResponse = response.json().await?;
            return self.parse_response(api_response);
        }

        Err(last_error
            .unwrap_or_else(|| SynthesizerError::MalformedOutput("Max retries exceeded".to_string())))
    }
}

/// Messages API response shape (the parts this client reads)
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
}
