use serde::{Deserialize, Serialize};
use std::fmt;

use crate::search::SearchCredentials;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language the model should answer in (e.g. "en", "zh")
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub poster: PosterSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            poster: PosterSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// Language-model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,

    /// API key; empty means "read MOONSHOT_API_KEY / API_KEY from the environment"
    #[serde(default)]
    pub api_key: String,

    /// Empty means "use the provider default"
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let provider = LlmProvider::Moonshot;
        Self {
            provider,
            api_key: String::new(),
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmSettings {
    /// Switch provider. Endpoint and model are replaced together with the provider.
    pub fn select_provider(&mut self, provider: LlmProvider) {
        self.provider = provider;
        self.base_url = provider.default_base_url().to_string();
        self.model = provider.default_model().to_string();
    }

    /// Fill an empty endpoint or model from the provider defaults.
    pub fn fill_provider_defaults(&mut self) {
        if self.base_url.trim().is_empty() {
            self.base_url = self.provider.default_base_url().to_string();
        }
        if self.model.trim().is_empty() {
            self.model = self.provider.default_model().to_string();
        }
    }

    /// Apply explicit endpoint/model overrides on top of the provider defaults.
    pub fn with_overrides(mut self, base_url: Option<String>, model: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    /// The key to send, falling back to the environment when the config holds none.
    pub fn effective_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        ["MOONSHOT_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
    }
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2000
}

/// Supported language-model providers. All of them speak the OpenAI chat-completions protocol.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Moonshot,
    OpenAI,
    DeepSeek,
    Qwen,
    Google,
    Mistral,
    Custom,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Moonshot => "https://api.moonshot.cn/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
            LlmProvider::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1",
            LlmProvider::Google => "https://generativelanguage.googleapis.com/v1beta/openai/",
            LlmProvider::Mistral => "https://api.mistral.ai/v1",
            LlmProvider::Custom => "",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Moonshot => "moonshot-v1-8k",
            LlmProvider::OpenAI => "gpt-4o",
            LlmProvider::DeepSeek => "deepseek-chat",
            LlmProvider::Qwen => "qwen-plus",
            LlmProvider::Google => "gemini-1.5-flash",
            LlmProvider::Mistral => "mistral-small-latest",
            LlmProvider::Custom => "",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "moonshot" => Some(LlmProvider::Moonshot),
            "openai" => Some(LlmProvider::OpenAI),
            "deepseek" => Some(LlmProvider::DeepSeek),
            "qwen" => Some(LlmProvider::Qwen),
            "google" | "gemini" => Some(LlmProvider::Google),
            "mistral" => Some(LlmProvider::Mistral),
            "custom" => Some(LlmProvider::Custom),
            _ => None,
        }
    }
}

/// Web search settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub provider: SearchProviderKind,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub google_api_key: String,

    /// Google Programmable Search engine id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub google_cx: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serper_api_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bing_api_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub yandex_api_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub yandex_user: String,
}

impl SearchSettings {
    /// Credentials for the active provider only.
    pub fn credentials(&self) -> SearchCredentials {
        let key = |s: &str| (!s.trim().is_empty()).then(|| s.trim().to_string());
        match self.provider {
            SearchProviderKind::Google => SearchCredentials {
                api_key: key(&self.google_api_key),
                index_id: key(&self.google_cx),
                user: None,
            },
            SearchProviderKind::Serper => SearchCredentials {
                api_key: key(&self.serper_api_key),
                ..SearchCredentials::default()
            },
            SearchProviderKind::Bing => SearchCredentials {
                api_key: key(&self.bing_api_key),
                ..SearchCredentials::default()
            },
            SearchProviderKind::Yandex => SearchCredentials {
                api_key: key(&self.yandex_api_key),
                index_id: None,
                user: key(&self.yandex_user),
            },
            SearchProviderKind::DuckDuckGo => SearchCredentials::default(),
        }
    }
}

/// Search engines the dispatcher can route to.
///
/// Parsed leniently from a string: anything unrecognised becomes `Google`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum SearchProviderKind {
    #[default]
    Google,
    Serper,
    Bing,
    Yandex,
    DuckDuckGo,
}

impl SearchProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProviderKind::Google => "google",
            SearchProviderKind::Serper => "serper",
            SearchProviderKind::Bing => "bing",
            SearchProviderKind::Yandex => "yandex",
            SearchProviderKind::DuckDuckGo => "duckduckgo",
        }
    }

    /// Label used in result tags and error strings.
    pub fn label(&self) -> &'static str {
        match self {
            SearchProviderKind::Google => "Google",
            SearchProviderKind::Serper => "Serper",
            SearchProviderKind::Bing => "Bing",
            SearchProviderKind::Yandex => "Yandex",
            SearchProviderKind::DuckDuckGo => "DuckDuckGo",
        }
    }
}

impl From<String> for SearchProviderKind {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "google" => SearchProviderKind::Google,
            "serper" => SearchProviderKind::Serper,
            "bing" => SearchProviderKind::Bing,
            "yandex" => SearchProviderKind::Yandex,
            "duckduckgo" | "ddg" => SearchProviderKind::DuckDuckGo,
            other => {
                tracing::warn!(provider = %other, "unknown search provider, defaulting to google");
                SearchProviderKind::Google
            }
        }
    }
}

impl From<SearchProviderKind> for String {
    fn from(kind: SearchProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SearchProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poster metadata API settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosterSettings {
    /// OMDb key; empty means "read OMDB_API_KEY from the environment"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub omdb_api_key: String,
}

impl PosterSettings {
    pub fn effective_omdb_key(&self) -> Option<String> {
        if !self.omdb_api_key.trim().is_empty() {
            return Some(self.omdb_api_key.trim().to_string());
        }
        std::env::var("OMDB_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// tracing EnvFilter directive; MEDIASCOUT_LOG overrides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Write logs to a daily-rolling file at this path instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}
