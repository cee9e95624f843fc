//! Knowledge-graph context boundary
//!
//! The capture pipeline may enrich synthesizer prompts with facts about
//! the user. Only the read contract lives here; retrieval failures are
//! caught by the orchestrator and treated as "no context".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the context provider
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// One entity retrieved from the knowledge graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntity {
    /// Entity name (e.g. a person, place, or recurring activity)
    pub name: String,

    /// Entity kind tag
    pub kind: String,

    /// Facts attached to the entity
    #[serde(default)]
    pub facts: Vec<String>,
}

/// Context retrieved for a capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphContext {
    /// Entities relevant to the query text
    pub entities: Vec<ContextEntity>,
}

impl GraphContext {
    /// Render as a prompt-friendly summary, or None when empty
    pub fn summary(&self) -> Option<String> {
        if self.entities.is_empty() {
            return None;
        }

        let mut out = String::new();
        for entity in &self.entities {
            out.push_str(&format!("- {} ({})", entity.name, entity.kind));
            if !entity.facts.is_empty() {
                out.push_str(&format!(": {}", entity.facts.join("; ")));
            }
            out.push('\n');
        }
        Some(out)
    }
}

/// Knowledge-graph read contract
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Retrieve context relevant to `query` for `user_id`
    async fn get_context(
        &self,
        query: &str,
        user_id: &str,
        max_entities: usize,
    ) -> Result<GraphContext, ContextError>;
}

/// Provider that always returns empty context
///
/// Stands in when no knowledge graph is configured.
pub struct NullContextProvider;

#[async_trait]
impl ContextProvider for NullContextProvider {
    async fn get_context(&self, _query: &str, _user_id: &str, _max: usize) -> Result<GraphContext, ContextError> {
        Ok(GraphContext::default())
    }
}
