//! Scripted fakes and fixtures shared by the integration tests.
//!
//! Nothing here touches the network: chat replies and search results are
//! scripted up front and every call is counted.
#![allow(dead_code)]

use async_trait::async_trait;
use mediascout::config::{Config, SearchProviderKind};
use mediascout::llm::types::{Message, ToolCall};
use mediascout::llm::{ChatBackend, ChatOutcome, ChatRequest, LlmError};
use mediascout::poster::{PosterRequest, PosterResolver};
use mediascout::search::{SearchCredentials, SearchError, SearchProvider, SearchResult};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Chat backend that plays back a fixed script of outcomes.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<ChatOutcome, LlmError>>>,
    repeat: Option<ChatOutcome>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    /// Answer with `outcomes` in order; further calls fail.
    pub fn new(outcomes: Vec<ChatOutcome>) -> Self {
        Self::with_results(outcomes.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ChatOutcome, LlmError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same outcome.
    pub fn repeating(outcome: ChatOutcome) -> Self {
        Self {
            repeat: Some(outcome),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatOutcome, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.repeat {
            Some(outcome) => Ok(outcome.clone()),
            None => Err(LlmError::InvalidResponse("script exhausted".into())),
        }
    }
}

/// Final text reply.
pub fn reply(text: &str) -> ChatOutcome {
    ChatOutcome::Reply(Message::assistant(text))
}

/// Reply requesting one function call per `(id, name, arguments)`.
pub fn tool_request(calls: &[(&str, &str, &str)]) -> ChatOutcome {
    ChatOutcome::Reply(Message::assistant_with_tool_calls(
        None,
        calls
            .iter()
            .map(|(id, name, args)| ToolCall::function(*id, *name, *args))
            .collect(),
    ))
}

pub fn rate_limited() -> ChatOutcome {
    ChatOutcome::RateLimited {
        detail: "429 Too Many Requests".into(),
    }
}

/// Search provider returning canned results and recording every query.
pub struct CountingProvider {
    kind: SearchProviderKind,
    images: bool,
    results: Vec<SearchResult>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl CountingProvider {
    pub fn new(kind: SearchProviderKind, results: Vec<SearchResult>) -> Self {
        Self {
            kind,
            images: false,
            results,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_images(mut self) -> Self {
        self.images = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for CountingProvider {
    fn kind(&self) -> SearchProviderKind {
        self.kind
    }

    fn supports_images(&self) -> bool {
        self.images
    }

    async fn search(
        &self,
        query: &str,
        _credentials: &SearchCredentials,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.results.is_empty() {
            return Err(SearchError::NoResults {
                provider: self.kind.label(),
            });
        }
        Ok(self.results.clone())
    }
}

pub fn result(title: &str, image: Option<&str>) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        link: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        snippet: format!("About {title}"),
        source: "Fake".to_string(),
        image: image.map(str::to_string),
    }
}

/// Poster resolver with a fixed answer.
pub struct StaticResolver {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PosterResolver for StaticResolver {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self, _request: &PosterRequest, _config: &Config) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Config with search enabled on `provider`.
pub fn search_config(provider: SearchProviderKind) -> Config {
    let mut config = Config::default();
    config.search.enabled = true;
    config.search.provider = provider;
    config
}

/// Test fixture for files that must outlive a single call
pub struct TestFixture {
    /// Temporary directory that gets cleaned up automatically
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let filepath = self.path().join(name);
        std::fs::write(&filepath, content).expect("Failed to write test file");
        filepath
    }

    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read test file")
    }
}
