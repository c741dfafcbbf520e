//! End-to-end tests of the inbound API with scripted model and search fakes

mod common;

use common::{reply, result, search_config, tool_request, CountingProvider, ScriptedBackend, StaticResolver};
use mediascout::agent::EngineOptions;
use mediascout::config::{Config, SearchProviderKind};
use mediascout::llm::LlmError;
use mediascout::media::{CollectionStatus, MediaItem, MediaType};
use mediascout::poster::{placeholder_url, PosterChain, PosterRequest, PosterResolver};
use mediascout::search::SearchDispatcher;
use mediascout::MediaScout;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const TWO_SERIES: &str = r#"[
  {"title":"Arcane","directorOrAuthor":"Christian Linke","cast":["Hailee Steinfeld","Ella Purnell","Kevin Alejandro","Katie Leung","Jason Spisak","Harry Lloyd"],"description":"Sisters in Piltover.","releaseDate":"2021-11-06","type":"TV Series","isOngoing":false,"latestUpdateInfo":"","rating":"9.0/10"},
  {"title":"Dune","directorOrAuthor":"Frank Herbert","cast":[],"releaseDate":"1965","type":"Novel","isOngoing":false,"rating":"8.8/10"}
]"#;

fn scout(backend: Arc<ScriptedBackend>) -> MediaScout {
    MediaScout::new()
        .with_backend(backend)
        .with_poster_chain(PosterChain::from_resolvers(vec![Arc::new(StaticResolver::new(None))]))
        .with_engine_options(EngineOptions {
            rate_limit_backoff: Duration::ZERO,
            ..EngineOptions::default()
        })
}

/// Resolver that only answers once every lookup of the batch is in flight.
struct BarrierResolver {
    barrier: Barrier,
}

#[async_trait::async_trait]
impl PosterResolver for BarrierResolver {
    fn name(&self) -> &'static str {
        "barrier"
    }

    async fn resolve(&self, request: &PosterRequest, _config: &Config) -> Option<String> {
        self.barrier.wait().await;
        Some(format!("https://img.example/{}.jpg", request.title.to_lowercase()))
    }
}

fn catalog_item(id: &str, title: &str, media_type: &str) -> MediaItem {
    serde_json::from_value(json!({ "id": id, "title": title, "type": media_type })).unwrap()
}

#[tokio::test]
async fn test_search_returns_finalized_items() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply(TWO_SERIES)]));

    let items = scout(backend.clone())
        .search(&Config::default(), "  arcane  ", None)
        .await;

    assert_eq!(items.len(), 2);
    for item in &items {
        assert!(!item.id.is_empty());
        assert!(!item.poster_url.is_empty());
        assert_eq!(item.status, CollectionStatus::ToWatch);
        assert_eq!(item.user_rating, 0);
    }
    assert_ne!(items[0].id, items[1].id);
    assert_eq!(items[0].cast.len(), 5);
    assert_eq!(items[0].poster_url, placeholder_url(MediaType::TvSeries));
    assert_eq!(items[1].media_type, MediaType::Book);

    let request = &backend.requests()[0];
    assert_eq!(request.temperature, 0.3);
    assert!(request.messages[1].text().contains("\"arcane\""));
}

#[tokio::test]
async fn test_posters_are_resolved_concurrently() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply(TWO_SERIES)]));
    let resolver: Arc<dyn PosterResolver> = Arc::new(BarrierResolver {
        barrier: Barrier::new(2),
    });
    let scout = scout(backend).with_poster_chain(PosterChain::from_resolvers(vec![resolver]));

    let items = tokio::time::timeout(
        Duration::from_secs(5),
        scout.search(&Config::default(), "arcane", None),
    )
    .await
    .expect("poster lookups ran one at a time");

    let posters: Vec<_> = items.iter().map(|i| i.poster_url.as_str()).collect();
    assert_eq!(posters, ["https://img.example/arcane.jpg", "https://img.example/dune.jpg"]);
}

#[tokio::test]
async fn test_search_type_filter_is_in_prompt() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply("[]")]));

    let items = scout(backend.clone())
        .search(&Config::default(), "dune", Some(MediaType::ShortDrama))
        .await;

    assert!(items.is_empty());
    assert!(backend.requests()[0].messages[1]
        .text()
        .contains("Strictly limit results to type: \"Short Drama\""));
}

#[tokio::test]
async fn test_search_with_web_results_and_search_posters() {
    let provider = Arc::new(
        CountingProvider::new(
            SearchProviderKind::Serper,
            vec![result("Arcane", Some("https://images.example.net/arcane.jpg"))],
        )
        .with_images(),
    );
    let mut dispatcher = SearchDispatcher::empty();
    dispatcher.register(provider.clone());

    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_request(&[("call_1", "web_search", r#"{"query":"arcane series"}"#)]),
        reply(r#"[{"title":"Arcane","type":"TV Series","releaseDate":"2021"}]"#),
    ]));
    let scout = MediaScout::new()
        .with_backend(backend.clone())
        .with_dispatcher(Arc::new(dispatcher));

    let items = scout
        .search(&search_config(SearchProviderKind::Serper), "arcane", None)
        .await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].poster_url, "https://images.example.net/arcane.jpg");
    assert_eq!(backend.calls(), 2);
    // one web search for the model, one poster lookup
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_blank_query_never_calls_model() {
    let backend = Arc::new(ScriptedBackend::new(Vec::new()));
    assert!(scout(backend.clone()).search(&Config::default(), " \t", None).await.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_model_failure_degrades_to_empty_list() {
    let backend = Arc::new(ScriptedBackend::with_results(vec![Err(LlmError::Network(
        "connection refused".into(),
    ))]));
    assert!(scout(backend).search(&Config::default(), "dune", None).await.is_empty());
}

#[tokio::test]
async fn test_prose_answer_degrades_to_empty_list() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply("Sorry, I can't help with that.")]));
    assert!(scout(backend).search(&Config::default(), "dune", None).await.is_empty());
}

#[tokio::test]
async fn test_trending_requests_four_titles() {
    let answer = json!([
        {"title": "One", "type": "Movie"},
        {"title": "Two", "type": "Movie"},
        {"title": "Three", "type": "TV Series"},
        {"title": "Four", "type": "Short Drama"},
        {"title": "Five", "type": "Movie"}
    ])
    .to_string();
    let backend = Arc::new(ScriptedBackend::new(vec![reply(&answer)]));

    let items = scout(backend.clone()).trending(&Config::default()).await;

    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|i| !i.poster_url.is_empty()));
    let request = &backend.requests()[0];
    assert_eq!(request.temperature, 0.5);
    assert!(request.messages[1].text().contains("Recommend 4"));
}

#[tokio::test]
async fn test_check_updates_maps_titles_back_to_ids() {
    let items = vec![
        catalog_item("id-op", "One Piece", "Comic"),
        catalog_item("id-tb", "The Boys", "TV Series"),
    ];
    let answer = r#"```json
[
  {"title": "ONE PIECE", "latestUpdateInfo": "Chapter 1130", "isOngoing": true},
  {"title": "Unrelated Show", "latestUpdateInfo": "Season 2", "isOngoing": true},
  {"title": "the boys", "latestUpdateInfo": "Season 4 Episode 8", "isOngoing": "false"}
]
```"#;
    let backend = Arc::new(ScriptedBackend::new(vec![reply(answer)]));

    let updates = scout(backend.clone())
        .check_updates(&Config::default(), &items)
        .await;

    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].id, "id-op");
    assert_eq!(updates[0].latest_update_info, "Chapter 1130");
    assert!(updates[0].is_ongoing);
    assert_eq!(updates[1].id, "id-tb");
    assert!(!updates[1].is_ongoing);

    let request = &backend.requests()[0];
    assert_eq!(request.temperature, 0.1);
    assert!(request.messages[1].text().contains("\"One Piece\" (Comic)"));
}

#[tokio::test]
async fn test_enrich_poster_ignores_placeholders() {
    let item = catalog_item("id-1", "Heat", "Movie");

    let none = MediaScout::new()
        .with_poster_chain(PosterChain::from_resolvers(vec![Arc::new(StaticResolver::new(None))]));
    assert_eq!(none.enrich_poster(&Config::default(), &item).await, None);

    let found = MediaScout::new().with_poster_chain(PosterChain::from_resolvers(vec![Arc::new(
        StaticResolver::new(Some("https://img.example/heat.jpg")),
    )]));
    assert_eq!(
        found.enrich_poster(&Config::default(), &item).await.as_deref(),
        Some("https://img.example/heat.jpg")
    );
}

#[tokio::test]
async fn test_missing_api_key_degrades_to_empty_list() {
    if std::env::var("MOONSHOT_API_KEY").is_ok() || std::env::var("API_KEY").is_ok() {
        return;
    }
    let scout = MediaScout::new()
        .with_poster_chain(PosterChain::from_resolvers(vec![Arc::new(StaticResolver::new(None))]));
    assert!(scout.search(&Config::default(), "dune", None).await.is_empty());
}
