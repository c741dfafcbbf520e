use crate::config::SearchSettings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

/// Tool execution context - the slice of the config snapshot a tool may read
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Id of the tool call being answered
    pub call_id: String,
    pub search: SearchSettings,
}

impl ToolContext {
    pub fn new(call_id: impl Into<String>, search: SearchSettings) -> Self {
        Self {
            call_id: call_id.into(),
            search,
        }
    }
}

/// Tool execution result handed back to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content of the tool-result message
    pub content: String,
    /// Additional metadata (result counts, provider, ...)
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ToolResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Tool execution errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Base tool trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Function name the model calls (e.g. "web_search")
    fn id(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON schema for tool parameters
    fn input_schema(&self) -> serde_json::Value;

    /// Function declaration in chat-completions `tools` format
    fn definition(&self) -> serde_json::Value {
        json!({
            "type": "function",
            "function": {
                "name": self.id(),
                "description": self.description(),
                "parameters": self.input_schema(),
            }
        })
    }

    /// Execute the tool with already-decoded parameters
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError>;
}
