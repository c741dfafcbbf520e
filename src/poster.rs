//! Cover image resolution.
//!
//! Resolvers are tried in order and the first hit wins. When every resolver comes up
//! empty the chain synthesizes a placeholder, so a resolved poster is never empty.

use crate::config::Config;
use crate::media::{MediaDraft, MediaItem, MediaType};
use crate::search::{usable_image, SearchDispatcher, SearchOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const OMDB_ENDPOINT: &str = "https://www.omdbapi.com/";

/// What to find a cover for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterRequest {
    pub title: String,
    pub year: Option<String>,
    pub media_type: MediaType,
}

impl PosterRequest {
    pub fn new(title: impl Into<String>, year: Option<&str>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            year: year.map(str::to_string),
            media_type,
        }
    }

    pub fn from_draft(draft: &MediaDraft) -> Self {
        Self::new(draft.title.trim(), draft.year(), draft.media_type)
    }

    pub fn from_item(item: &MediaItem) -> Self {
        Self::new(item.title.trim(), item.year(), item.media_type)
    }

    fn title_and_year(&self) -> String {
        match &self.year {
            Some(year) => format!("{} {}", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// One step of the resolution chain.
#[async_trait]
pub trait PosterResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// A usable image URL, or `None` to move on to the next resolver.
    async fn resolve(&self, request: &PosterRequest, config: &Config) -> Option<String>;
}

/// Looks for an image through the active search provider.
///
/// Tries a query phrased for the configured language first, then a generic one.
pub struct SearchPosterResolver {
    dispatcher: Arc<SearchDispatcher>,
}

impl SearchPosterResolver {
    pub fn new(dispatcher: Arc<SearchDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl PosterResolver for SearchPosterResolver {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn resolve(&self, request: &PosterRequest, config: &Config) -> Option<String> {
        if !self.dispatcher.supports_images(&config.search) {
            tracing::trace!(provider = %config.search.provider, "search provider has no images, skipping");
            return None;
        }

        for query in poster_queries(request, &config.language) {
            if let SearchOutcome::Results(results) =
                self.dispatcher.dispatch(&query, &config.search).await
            {
                if let Some(image) = results
                    .iter()
                    .find_map(|r| usable_image(r.image.as_deref()))
                {
                    tracing::debug!(title = %request.title, query = %query, "poster found via search");
                    return Some(image);
                }
            }
        }
        None
    }
}

/// Localized query first, then the generic phrasing (skipped when identical).
pub fn poster_queries(request: &PosterRequest, language: &str) -> Vec<String> {
    let subject = request.title_and_year();
    let generic = format!("{subject} poster");

    let lang = language.trim().to_ascii_lowercase();
    let localized = if lang.starts_with("zh") {
        format!("{subject} {} 海报", zh_type_word(request.media_type))
    } else if lang.starts_with("ja") {
        format!("{subject} {} ポスター", ja_type_word(request.media_type))
    } else {
        format!("{} {subject} poster cover", request.media_type.label().to_lowercase())
    };

    if localized == generic {
        vec![generic]
    } else {
        vec![localized, generic]
    }
}

fn zh_type_word(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Book => "书籍 封面",
        MediaType::Movie => "电影",
        MediaType::TvSeries => "电视剧",
        MediaType::Comic => "漫画 封面",
        MediaType::ShortDrama => "短剧",
        MediaType::Music => "专辑 封面",
        MediaType::Other => "作品",
    }
}

fn ja_type_word(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Book => "本 表紙",
        MediaType::Movie => "映画",
        MediaType::TvSeries => "ドラマ",
        MediaType::Comic => "漫画 表紙",
        MediaType::ShortDrama => "ショートドラマ",
        MediaType::Music => "アルバム",
        MediaType::Other => "作品",
    }
}

/// OMDb title+year lookup. Skipped when no key is configured.
pub struct OmdbPosterResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl OmdbPosterResolver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            endpoint: OMDB_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Poster URL from an OMDb response, if the lookup succeeded.
    pub fn parse_response(json: &serde_json::Value) -> Option<String> {
        if json["Response"].as_str() != Some("True") {
            return None;
        }
        let poster = json["Poster"].as_str()?;
        if poster.eq_ignore_ascii_case("N/A") {
            return None;
        }
        usable_image(Some(poster))
    }
}

impl Default for OmdbPosterResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PosterResolver for OmdbPosterResolver {
    fn name(&self) -> &'static str {
        "omdb"
    }

    async fn resolve(&self, request: &PosterRequest, config: &Config) -> Option<String> {
        let api_key = config.poster.effective_omdb_key()?;

        let mut query = vec![("t", request.title.as_str()), ("apikey", api_key.as_str())];
        if let Some(year) = &request.year {
            query.push(("y", year.as_str()));
        }

        let response = match self.client.get(&self.endpoint).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    title = %request.title,
                    error = %crate::logging::redact_secrets(&e.to_string()),
                    "omdb lookup failed"
                );
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(title = %request.title, status = %response.status(), "omdb lookup failed");
            return None;
        }

        match response.json::<serde_json::Value>().await {
            Ok(json) => Self::parse_response(&json),
            Err(e) => {
                tracing::warn!(title = %request.title, error = %e, "omdb returned invalid json");
                None
            }
        }
    }
}

/// Ordered list of resolvers with a placeholder fallback.
pub struct PosterChain {
    resolvers: Vec<Arc<dyn PosterResolver>>,
}

impl PosterChain {
    /// Search first, then OMDb.
    pub fn new(dispatcher: Arc<SearchDispatcher>) -> Self {
        Self::from_resolvers(vec![
            Arc::new(SearchPosterResolver::new(dispatcher)),
            Arc::new(OmdbPosterResolver::new()),
        ])
    }

    pub fn from_resolvers(resolvers: Vec<Arc<dyn PosterResolver>>) -> Self {
        Self { resolvers }
    }

    /// First real image any resolver finds.
    pub async fn resolve_real(&self, request: &PosterRequest, config: &Config) -> Option<String> {
        for resolver in &self.resolvers {
            if let Some(url) = resolver.resolve(request, config).await {
                tracing::debug!(resolver = resolver.name(), title = %request.title, "poster resolved");
                return Some(url);
            }
        }
        None
    }

    /// A real image if one can be found, otherwise the placeholder for the item's type.
    pub async fn resolve(&self, request: &PosterRequest, config: &Config) -> String {
        match self.resolve_real(request, config).await {
            Some(url) => url,
            None => {
                tracing::debug!(title = %request.title, "no poster found, using placeholder");
                placeholder_url(request.media_type)
            }
        }
    }
}

/// Deterministic placeholder image labelled with the media type.
pub fn placeholder_url(media_type: MediaType) -> String {
    let background = match media_type {
        MediaType::Book => "3c3c3c",
        MediaType::Movie => "1a1a1a",
        MediaType::TvSeries => "2b2b2b",
        MediaType::Comic => "4d4d4d",
        MediaType::ShortDrama => "5e5e5e",
        MediaType::Music => "6f6f6f",
        MediaType::Other => "808080",
    };
    format!(
        "https://placehold.co/600x900/{background}/FFF?text={}",
        media_type.label().replace(' ', "+")
    )
}
