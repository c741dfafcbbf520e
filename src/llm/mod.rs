pub mod openai;
pub mod types;

pub use openai::OpenAiClient;
pub use types::{Message, Role, ToolCall};

/// One chat-completions request, built from the config snapshot of a single call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Tool declarations; `tool_choice=auto` is sent only when this is present
    pub tools: Option<Vec<serde_json::Value>>,
}

/// Classified result of a transport call.
///
/// Rate limiting and missing tool support are recoverable and get their own variants so
/// the engine can apply its retry policy; everything else is an `LlmError`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Reply(Message),
    RateLimited { detail: String },
    ToolsUnsupported { detail: String },
}

/// Transport failures that end a conversation
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("API endpoint is not configured")]
    MissingEndpoint,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Language-model endpoint abstraction
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatOutcome, LlmError>;
}
