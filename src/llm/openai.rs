use super::types::{ChatCompletion, Message};
use super::{ChatBackend, ChatOutcome, ChatRequest, LlmError};
use crate::config::LlmSettings;
use crate::logging::redact_secrets;
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// Client for OpenAI-compatible chat-completions endpoints
/// (Moonshot, OpenAI, DeepSeek, Qwen, Gemini's OpenAI layer, Mistral, custom).
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from a settings snapshot, resolving the key from the environment if needed.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.effective_api_key().ok_or(LlmError::MissingApiKey)?;
        if settings.base_url.trim().is_empty() {
            return Err(LlmError::MissingEndpoint);
        }
        Ok(Self::new(settings.base_url.trim(), api_key))
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatOutcome, LlmError> {
        let url = self.completions_url();

        tracing::debug!(
            url = %url,
            model = %request.model,
            message_count = request.messages.len(),
            tool_count = request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "chat completion request"
        );

        let body = CompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: request.tools.as_deref(),
            tool_choice: request.tools.as_ref().map(|_| "auto"),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(redact_secrets(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error_text = redact_secrets(&error_text);

            tracing::warn!(status = %status, error = %error_text, "chat completion returned error");

            return classify_failure(status, error_text, request.tools.is_some());
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        first_message(completion).map(ChatOutcome::Reply)
    }
}

/// Map a non-2xx response onto the retry classes the engine understands.
fn classify_failure(
    status: StatusCode,
    error_text: String,
    offered_tools: bool,
) -> Result<ChatOutcome, LlmError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Ok(ChatOutcome::RateLimited { detail: error_text });
    }
    if status == StatusCode::BAD_REQUEST
        && offered_tools
        && error_text.to_ascii_lowercase().contains("tools")
    {
        return Ok(ChatOutcome::ToolsUnsupported { detail: error_text });
    }
    Err(LlmError::Api {
        status: status.as_u16(),
        message: error_text,
    })
}

fn first_message(completion: ChatCompletion) -> Result<Message, LlmError> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [serde_json::Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}
