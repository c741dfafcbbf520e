use super::providers::{
    BingSearchProvider, DuckDuckGoSearchProvider, GoogleSearchProvider, SerperSearchProvider,
    YandexSearchProvider,
};
use super::{SearchProvider, SearchResult};
use crate::config::{SearchProviderKind, SearchSettings};
use std::collections::HashMap;
use std::sync::Arc;

/// Literal returned when search is switched off in the config snapshot.
pub const SEARCH_DISABLED: &str = "Search disabled";

/// Tool-result text used when a search succeeded with nothing to show.
pub const NO_RELEVANT_RESULTS: &str = "No relevant results found.";

/// What a dispatch produced: normalized results, or a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Results(Vec<SearchResult>),
    Message(String),
}

impl SearchOutcome {
    /// Content for a tool-result message in the model conversation.
    pub fn to_tool_content(&self) -> String {
        match self {
            SearchOutcome::Results(results) if results.is_empty() => {
                NO_RELEVANT_RESULTS.to_string()
            }
            SearchOutcome::Results(results) => serde_json::to_string(results)
                .unwrap_or_else(|_| NO_RELEVANT_RESULTS.to_string()),
            SearchOutcome::Message(message) if message.trim().is_empty() => {
                NO_RELEVANT_RESULTS.to_string()
            }
            SearchOutcome::Message(message) => message.clone(),
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::Message(_) => &[],
        }
    }
}

/// Routes queries to the adapter selected by the config snapshot.
///
/// Unknown or unregistered providers fall back to Google. Adapters are called at most
/// once per dispatch; retry policy lives in the conversation engine.
pub struct SearchDispatcher {
    providers: HashMap<SearchProviderKind, Arc<dyn SearchProvider>>,
}

impl SearchDispatcher {
    /// Dispatcher with every built-in adapter registered
    pub fn new() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(Arc::new(GoogleSearchProvider::new()));
        dispatcher.register(Arc::new(SerperSearchProvider::new()));
        dispatcher.register(Arc::new(BingSearchProvider::new()));
        dispatcher.register(Arc::new(YandexSearchProvider::new()));
        dispatcher.register(Arc::new(DuckDuckGoSearchProvider::new()));
        dispatcher
    }

    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register (or replace) the adapter for its engine
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Adapter for `kind`, falling back to Google
    pub fn provider(&self, kind: SearchProviderKind) -> Option<&Arc<dyn SearchProvider>> {
        self.providers.get(&kind).or_else(|| {
            if kind != SearchProviderKind::Google {
                tracing::warn!(provider = %kind, "search provider not registered, falling back to google");
            }
            self.providers.get(&SearchProviderKind::Google)
        })
    }

    /// Whether the active provider can return image-bearing results.
    pub fn supports_images(&self, settings: &SearchSettings) -> bool {
        settings.enabled
            && self
                .provider(settings.provider)
                .is_some_and(|p| p.supports_images())
    }

    /// Run `query` against the configured provider. Never fails: errors become messages.
    pub async fn dispatch(&self, query: &str, settings: &SearchSettings) -> SearchOutcome {
        if !settings.enabled {
            return SearchOutcome::Message(SEARCH_DISABLED.to_string());
        }

        let Some(provider) = self.provider(settings.provider) else {
            return SearchOutcome::Message(format!(
                "Error: search provider '{}' is not available",
                settings.provider
            ));
        };

        // Credentials must match the adapter actually used, which differs after a fallback.
        let credentials = if provider.kind() == settings.provider {
            settings.credentials()
        } else {
            SearchSettings {
                provider: provider.kind(),
                ..settings.clone()
            }
            .credentials()
        };

        tracing::debug!(provider = %provider.kind(), query = %query, "dispatching search");

        match provider.search(query, &credentials).await {
            Ok(results) => {
                tracing::debug!(
                    provider = %provider.kind(),
                    result_count = results.len(),
                    "search dispatched"
                );
                SearchOutcome::Results(results)
            }
            Err(e) => {
                tracing::warn!(provider = %provider.kind(), error = %e, "search returned no usable results");
                SearchOutcome::Message(e.to_string())
            }
        }
    }
}

impl Default for SearchDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
