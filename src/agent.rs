use crate::config::{Config, SearchSettings};
use crate::llm::types::{Message, ToolCall};
use crate::llm::{ChatBackend, ChatOutcome, ChatRequest, LlmError};
use crate::tool::base::{Tool, ToolContext, ToolError};
use crate::tool::WebSearchTool;
use std::sync::Arc;
use std::time::Duration;

/// Hard cap on model calls per exchange.
pub const DEFAULT_MAX_TURNS: usize = 5;

/// Wait before the single retry of a rate-limited request.
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

const SYSTEM_WARNING_OPEN: &str = "[System Warning:";

/// Notice prepended to answers produced after the model rejected the search tool.
pub fn tools_unsupported_warning(model: &str) -> String {
    format!("{SYSTEM_WARNING_OPEN} The model '{model}' does not support web search. Responding without search.]")
}

/// Split a leading system warning off an answer.
pub fn split_system_warning(text: &str) -> (Option<&str>, &str) {
    if text.starts_with(SYSTEM_WARNING_OPEN) {
        if let Some((warning, rest)) = text.split_once("]\n\n") {
            return (Some(&text[..warning.len() + 1]), rest);
        }
    }
    (None, text)
}

/// Hard failures out of an exchange. Exhausting the turn cap is not one of them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Rate limit exceeded after retry: {0}")]
    RateLimited(String),

    #[error("Model rejected the request without tools: {0}")]
    ToolsRejected(String),
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_turns: usize,
    pub rate_limit_backoff: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }
}

/// Per-exchange parameters, copied out of the config snapshot.
#[derive(Debug, Clone)]
pub struct ExchangeParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub search: SearchSettings,
}

impl ExchangeParams {
    pub fn from_config(config: &Config, temperature: f32) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature,
            max_tokens: Some(config.llm.max_tokens),
            search: config.search.clone(),
        }
    }
}

/// Where an exchange currently is.
#[derive(Debug)]
enum TurnState {
    AwaitingModel,
    ModelResponded(Message),
    ToolCallRequested(Message),
    ToolsExecuted,
    Terminal(String),
}

/// Drives a bounded tool-calling exchange with the model.
///
/// Turns are strictly sequential and the tool calls inside a turn run one after another,
/// so tool results land in the history in the order the model requested them.
pub struct ConversationEngine {
    backend: Arc<dyn ChatBackend>,
    search_tool: Arc<WebSearchTool>,
    options: EngineOptions,
}

impl ConversationEngine {
    pub fn new(backend: Arc<dyn ChatBackend>, search_tool: Arc<WebSearchTool>) -> Self {
        Self {
            backend,
            search_tool,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the exchange to a terminal answer.
    ///
    /// Returns `Ok(None)` when the turn cap is exhausted without a terminal reply.
    pub async fn run(
        &self,
        messages: Vec<Message>,
        params: &ExchangeParams,
    ) -> Result<Option<String>, EngineError> {
        let mut history = messages;
        let mut tools = params
            .search
            .enabled
            .then(|| vec![self.search_tool.definition()]);
        let mut tools_dropped = false;
        let mut turns = 0usize;
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    if turns >= self.options.max_turns {
                        tracing::warn!(turns, "turn cap reached without a final answer");
                        return Ok(None);
                    }
                    let mut request = ChatRequest {
                        model: params.model.clone(),
                        messages: history.clone(),
                        temperature: params.temperature,
                        max_tokens: params.max_tokens,
                        tools: tools.clone(),
                    };
                    let reply = match self.complete_with_retry(&request).await? {
                        ChatOutcome::Reply(reply) => reply,
                        ChatOutcome::ToolsUnsupported { detail } if request.tools.is_some() => {
                            tracing::warn!(model = %params.model, detail = %detail, "model does not support tools, retrying without");
                            tools = None;
                            tools_dropped = true;
                            request.tools = None;
                            match self.complete_with_retry(&request).await? {
                                ChatOutcome::Reply(reply) => reply,
                                ChatOutcome::ToolsUnsupported { detail }
                                | ChatOutcome::RateLimited { detail } => {
                                    return Err(EngineError::ToolsRejected(detail));
                                }
                            }
                        }
                        ChatOutcome::ToolsUnsupported { detail } => {
                            return Err(EngineError::ToolsRejected(detail));
                        }
                        ChatOutcome::RateLimited { detail } => {
                            return Err(EngineError::RateLimited(detail));
                        }
                    };
                    TurnState::ModelResponded(reply)
                }
                TurnState::ModelResponded(reply) => {
                    if reply.requested_tool_calls().is_empty() {
                        TurnState::Terminal(reply.text().to_string())
                    } else {
                        TurnState::ToolCallRequested(reply)
                    }
                }
                TurnState::ToolCallRequested(reply) => {
                    let calls = reply.requested_tool_calls().to_vec();
                    tracing::debug!(turn = turns, count = calls.len(), "executing tool calls");
                    history.push(reply);
                    for call in &calls {
                        let content = self.execute_tool_call(call, &params.search).await;
                        history.push(Message::tool_result(&call.id, &call.function.name, content));
                    }
                    TurnState::ToolsExecuted
                }
                TurnState::ToolsExecuted => {
                    turns += 1;
                    TurnState::AwaitingModel
                }
                TurnState::Terminal(text) => {
                    tracing::debug!(turns, answer_len = text.len(), "exchange finished");
                    if tools_dropped {
                        return Ok(Some(format!(
                            "{}\n\n{}",
                            tools_unsupported_warning(&params.model),
                            text
                        )));
                    }
                    return Ok(Some(text));
                }
            };
        }
    }

    /// One transport call, retried exactly once if the endpoint reports rate limiting.
    async fn complete_with_retry(&self, request: &ChatRequest) -> Result<ChatOutcome, EngineError> {
        match self.backend.complete(request).await? {
            ChatOutcome::RateLimited { detail } => {
                tracing::warn!(
                    backoff_ms = self.options.rate_limit_backoff.as_millis() as u64,
                    detail = %detail,
                    "rate limited, retrying once"
                );
                tokio::time::sleep(self.options.rate_limit_backoff).await;
                match self.backend.complete(request).await? {
                    ChatOutcome::RateLimited { detail } => Err(EngineError::RateLimited(detail)),
                    other => Ok(other),
                }
            }
            other => Ok(other),
        }
    }

    /// Produce the tool-result content for one call. Protocol problems become text.
    async fn execute_tool_call(&self, call: &ToolCall, search: &SearchSettings) -> String {
        let name = call.function.name.as_str();

        // Backend-native tools (e.g. Moonshot's `$web_search`) run server-side; echo the arguments.
        if name.starts_with('$') || call.call_type == "builtin_function" {
            tracing::debug!(tool = %name, "acknowledging backend-native tool call");
            return call.function.arguments.clone();
        }

        if !WebSearchTool::answers_to(name) {
            tracing::warn!(tool = %name, "model requested an unknown tool");
            return format!("Error: Tool '{name}' not found");
        }

        let raw_args = if call.function.arguments.trim().is_empty() {
            "{}"
        } else {
            call.function.arguments.as_str()
        };
        let args: serde_json::Value = match serde_json::from_str(raw_args) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "malformed tool arguments");
                return format!("Error: Invalid parameters for {name}: {e}");
            }
        };

        let ctx = ToolContext::new(call.id.clone(), search.clone());
        match self.search_tool.execute(args, &ctx).await {
            Ok(result) => {
                tracing::debug!(
                    tool = %name,
                    call_id = %call.id,
                    searched = ?result.metadata.get("searched"),
                    num_results = ?result.metadata.get("num_results"),
                    "tool call finished"
                );
                result.content
            }
            Err(ToolError::InvalidParams(msg)) => format!("Error: Invalid parameters for {name}: {msg}"),
            Err(e) => format!("Error: {name} failed: {e}"),
        }
    }
}
