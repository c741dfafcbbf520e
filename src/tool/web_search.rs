use crate::search::{SearchDispatcher, SearchOutcome};
use crate::tool::base::{Tool, ToolContext, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Names the model may use for this tool. Some backends prefer `google_search`.
pub const SEARCH_TOOL_NAMES: &[&str] = &["web_search", "google_search"];

/// Web search tool - the single tool declared to every language-model backend.
///
/// The declaration is the same for every backend; the configured search provider is
/// chosen per call by the dispatcher from the context's config snapshot.
pub struct WebSearchTool {
    dispatcher: Arc<SearchDispatcher>,
}

impl WebSearchTool {
    pub fn new(dispatcher: Arc<SearchDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn answers_to(name: &str) -> bool {
        SEARCH_TOOL_NAMES.contains(&name)
    }
}

#[derive(Debug, Deserialize)]
struct WebSearchParams {
    query: String,
}

#[async_trait]
impl Tool for WebSearchTool {
    fn id(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for real-time information. Use this tool when you need current events, \
         news, release dates, or other specific data."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let params: WebSearchParams = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        if params.query.trim().is_empty() {
            return Err(ToolError::InvalidParams("query cannot be empty".into()));
        }

        tracing::debug!(call_id = %ctx.call_id, query = %params.query, "web_search tool call");

        let outcome = self.dispatcher.dispatch(params.query.trim(), &ctx.search).await;
        let num_results = outcome.results().len();
        let searched = matches!(outcome, SearchOutcome::Results(_));

        Ok(ToolResult::new(outcome.to_tool_content())
            .with_metadata("num_results", json!(num_results))
            .with_metadata("searched", json!(searched))
            .with_metadata("query", json!(params.query)))
    }
}
