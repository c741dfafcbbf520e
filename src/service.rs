//! Inbound API used by the presentation layer.
//!
//! Every operation takes the caller's current `Config`, snapshots it, and degrades to an
//! empty result instead of returning an error.

use crate::agent::{split_system_warning, ConversationEngine, EngineOptions, ExchangeParams};
use crate::config::Config;
use crate::extract::extract_records;
use crate::llm::openai::OpenAiClient;
use crate::llm::types::Message;
use crate::llm::ChatBackend;
use crate::media::{MediaDraft, MediaItem, MediaType, UpdateDraft, UpdateInfo};
use crate::poster::{PosterChain, PosterRequest};
use crate::search::SearchDispatcher;
use crate::tool::WebSearchTool;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of titles requested for the trending shelf.
pub const TRENDING_COUNT: usize = 4;

const TRENDING_TEMPERATURE: f32 = 0.5;
const UPDATES_TEMPERATURE: f32 = 0.1;

const CURATOR_PROMPT: &str = "You are a helpful media encyclopedia and curator.
When searching or recommending, you must return a VALID JSON array of objects.
Do not wrap the JSON in markdown code blocks. Just return the raw JSON array.
Each object must have the following fields:
- title: string
- directorOrAuthor: string
- cast: string[] (max 5 main actors, empty for books if not applicable)
- description: string (approx 150 words, covering theme and background)
- releaseDate: string (YYYY-MM-DD preferred, or YYYY)
- type: one of [\"Book\", \"Movie\", \"TV Series\", \"Comic\", \"Short Drama\", \"Music\", \"Other\"]
- isOngoing: boolean
- latestUpdateInfo: string (empty if completed)
- rating: string (e.g. \"8.5/10\")

Ensure data is accurate.";

const TRACKER_PROMPT: &str =
    "You are a media update tracker. Return ONLY a raw JSON array. No markdown.";

/// Search-augmented media lookup.
pub struct MediaScout {
    dispatcher: Arc<SearchDispatcher>,
    backend: Option<Arc<dyn ChatBackend>>,
    posters: Arc<PosterChain>,
    engine_options: EngineOptions,
}

impl MediaScout {
    /// All built-in search providers, posters from search then OMDb, and an
    /// OpenAI-compatible client built from each call's config.
    pub fn new() -> Self {
        let dispatcher = Arc::new(SearchDispatcher::new());
        Self {
            posters: Arc::new(PosterChain::new(dispatcher.clone())),
            dispatcher,
            backend: None,
            engine_options: EngineOptions::default(),
        }
    }

    /// Use a fixed chat backend instead of building one from the config.
    pub fn with_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the search dispatcher. The poster chain is rebuilt on top of it.
    pub fn with_dispatcher(mut self, dispatcher: Arc<SearchDispatcher>) -> Self {
        self.posters = Arc::new(PosterChain::new(dispatcher.clone()));
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_poster_chain(mut self, posters: PosterChain) -> Self {
        self.posters = Arc::new(posters);
        self
    }

    pub fn with_engine_options(mut self, options: EngineOptions) -> Self {
        self.engine_options = options;
        self
    }

    /// Find works matching `query`, optionally restricted to one type.
    pub async fn search(
        &self,
        config: &Config,
        query: &str,
        type_filter: Option<MediaType>,
    ) -> Vec<MediaItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let config = config.clone();

        let mut prompt = format!("Search for media works matching the query: \"{query}\".");
        match type_filter {
            Some(media_type) => {
                prompt.push_str(&format!(" Strictly limit results to type: \"{media_type}\"."));
            }
            None => prompt.push_str(" (books, movies, TV series, comics, short dramas)"),
        }
        prompt.push_str(
            " Perform a fuzzy search to find the most relevant results. \
             Do not limit the number of results, return as many as possible.",
        );

        let messages = vec![
            Message::system(curator_prompt(&config.language)),
            Message::user(prompt),
        ];

        let Some(answer) = self.exchange(&config, messages, config.llm.temperature).await else {
            return Vec::new();
        };
        let items = self.finalize(&config, drafts_from(&answer)).await;
        tracing::info!(query = %query, count = items.len(), "search finished");
        items
    }

    /// Recently released titles with the highest popularity.
    pub async fn trending(&self, config: &Config) -> Vec<MediaItem> {
        let config = config.clone();
        let today = chrono::Utc::now().format("%Y-%m-%d");

        let mut prompt = format!(
            "Today is {today}. Recommend {TRENDING_COUNT} currently trending movies, TV series, or dramas \
             that have been updated or released within the last 2 months. Focus on the highest \
             popularity/heat. Ensure the results are strictly from the recent 60 days."
        );
        if !config.search.enabled {
            prompt.push_str(
                "\n\n(Note: If you cannot access real-time data, recommend the most widely \
                 discussed and anticipated recent titles you know of.)",
            );
        }

        let messages = vec![
            Message::system(curator_prompt(&config.language)),
            Message::user(prompt),
        ];

        let Some(answer) = self.exchange(&config, messages, TRENDING_TEMPERATURE).await else {
            return Vec::new();
        };
        let mut drafts = drafts_from(&answer);
        drafts.truncate(TRENDING_COUNT);
        let items = self.finalize(&config, drafts).await;
        tracing::info!(count = items.len(), "trending finished");
        items
    }

    /// Latest release information for catalog items, matched back to them by title.
    pub async fn check_updates(&self, config: &Config, items: &[MediaItem]) -> Vec<UpdateInfo> {
        if items.is_empty() {
            return Vec::new();
        }
        let config = config.clone();

        let title_to_id: HashMap<String, &str> = items
            .iter()
            .map(|item| (normalize_title(&item.title), item.id.as_str()))
            .collect();

        let query_list = items
            .iter()
            .map(|item| format!("\"{}\" ({})", item.title, item.media_type))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Provide the latest update information (latest episode, chapter, etc.) for the following titles: {query_list}.
Return a JSON array with objects containing:
- title: string (exact match)
- latestUpdateInfo: string (e.g. \"Season 4 Episode 8\" or \"Chapter 1052\")
- isOngoing: boolean (true if still updating)"
        );

        let messages = vec![
            Message::system(format!("{TRACKER_PROMPT}\n{}", language_instruction(&config.language))),
            Message::user(prompt),
        ];

        let Some(answer) = self.exchange(&config, messages, UPDATES_TEMPERATURE).await else {
            return Vec::new();
        };
        let (_, body) = split_system_warning(&answer);

        let updates: Vec<UpdateInfo> = extract_records(body)
            .into_iter()
            .filter_map(UpdateDraft::from_record)
            .filter_map(|update| {
                let Some(id) = title_to_id.get(&normalize_title(&update.title)) else {
                    tracing::debug!(title = %update.title, "update for unknown title dropped");
                    return None;
                };
                Some(UpdateInfo {
                    id: id.to_string(),
                    latest_update_info: update.latest_update_info,
                    is_ongoing: update.is_ongoing,
                })
            })
            .collect();
        tracing::info!(requested = items.len(), matched = updates.len(), "update check finished");
        updates
    }

    /// Look up a real cover for a catalog item that has none. Placeholders are not returned.
    pub async fn enrich_poster(&self, config: &Config, item: &MediaItem) -> Option<String> {
        let config = config.clone();
        self.posters
            .resolve_real(&PosterRequest::from_item(item), &config)
            .await
    }

    /// Run one model exchange. Every failure is logged and reported as "no answer".
    async fn exchange(
        &self,
        config: &Config,
        messages: Vec<Message>,
        temperature: f32,
    ) -> Option<String> {
        let backend: Arc<dyn ChatBackend> = match &self.backend {
            Some(backend) => backend.clone(),
            None => match OpenAiClient::from_settings(&config.llm) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    tracing::error!(provider = ?config.llm.provider, error = %e, "chat backend unavailable");
                    return None;
                }
            },
        };

        let engine = ConversationEngine::new(
            backend,
            Arc::new(WebSearchTool::new(self.dispatcher.clone())),
        )
        .with_options(self.engine_options.clone());
        let params = ExchangeParams::from_config(config, temperature);

        match engine.run(messages, &params).await {
            Ok(Some(answer)) if !answer.trim().is_empty() => {
                if let (Some(warning), _) = split_system_warning(&answer) {
                    tracing::warn!(model = %params.model, "{warning}");
                }
                Some(answer)
            }
            Ok(_) => {
                tracing::info!(model = %params.model, "model produced no answer");
                None
            }
            Err(e) => {
                tracing::error!(model = %params.model, error = %e, "chat exchange failed");
                None
            }
        }
    }

    /// Resolve posters for every draft concurrently and attach collection metadata.
    async fn finalize(&self, config: &Config, drafts: Vec<MediaDraft>) -> Vec<MediaItem> {
        join_all(drafts.into_iter().map(|draft| async move {
            let poster = self
                .posters
                .resolve(&PosterRequest::from_draft(&draft), config)
                .await;
            MediaItem::from_draft(draft, poster)
        }))
        .await
    }
}

impl Default for MediaScout {
    fn default() -> Self {
        Self::new()
    }
}

fn drafts_from(answer: &str) -> Vec<MediaDraft> {
    let (_, body) = split_system_warning(answer);
    extract_records(body)
        .into_iter()
        .filter_map(MediaDraft::from_record)
        .collect()
}

fn curator_prompt(language: &str) -> String {
    format!("{CURATOR_PROMPT}\n{}", language_instruction(language))
}

fn language_instruction(language: &str) -> String {
    let code = language.trim().to_ascii_lowercase();
    let name = match code.split(['-', '_']).next().unwrap_or("") {
        "" | "en" => "English",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        _ => language.trim(),
    };
    format!(
        "Write all free-text values in {name}. Keep JSON keys and the type values exactly as listed."
    )
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_instruction() {
        assert!(language_instruction("zh-CN").contains("Chinese"));
        assert!(language_instruction("").contains("English"));
        assert!(language_instruction("pt").contains("in pt."));
    }

    #[test]
    fn test_drafts_from_skips_warning_prefix() {
        let answer = format!(
            "{}\n\n[{{\"title\":\"Dune\",\"type\":\"Movie\"}}]",
            crate::agent::tools_unsupported_warning("m")
        );
        let drafts = drafts_from(&answer);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let scout = MediaScout::new();
        assert!(scout.search(&Config::default(), "   ", None).await.is_empty());
        assert!(scout.check_updates(&Config::default(), &[]).await.is_empty());
    }
}
