use crate::config::SearchProviderKind;
use crate::search::{
    decode_html_entities, SearchCredentials, SearchError, SearchProvider, SearchResult,
    MAX_RESULTS,
};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

const ENDPOINT: &str = "https://yandex.com/search/xml";

/// Yandex XML search provider
///
/// The response is a fixed XML document shape, so it is scraped with regexes
/// rather than a full XML parser. Results carry no images.
pub struct YandexSearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

struct XmlPatterns {
    doc: Regex,
    title: Regex,
    url: Regex,
    passage: Regex,
    error: Regex,
    tag: Regex,
}

fn patterns() -> &'static XmlPatterns {
    static PATTERNS: OnceLock<XmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| XmlPatterns {
        doc: Regex::new(r"(?s)<doc(?:\s[^>]*)?>(.*?)</doc>").expect("valid regex"),
        title: Regex::new(r"(?s)<title>(.*?)</title>").expect("valid regex"),
        url: Regex::new(r"(?s)<url>(.*?)</url>").expect("valid regex"),
        passage: Regex::new(r"(?s)<headline>(.*?)</headline>|<passage>(.*?)</passage>")
            .expect("valid regex"),
        error: Regex::new(r"(?s)<error[^>]*>(.*?)</error>").expect("valid regex"),
        tag: Regex::new(r"<[^>]+>").expect("valid regex"),
    })
}

impl YandexSearchProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            endpoint: ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Extract `<doc>` entries from a Yandex XML response body
    pub fn parse_response(xml: &str) -> Result<Vec<SearchResult>, SearchError> {
        let p = patterns();
        let clean = |raw: &str| decode_html_entities(p.tag.replace_all(raw, "").trim());

        let mut results = Vec::new();
        for doc in p.doc.captures_iter(xml) {
            if results.len() >= MAX_RESULTS {
                break;
            }
            let body = &doc[1];
            let (Some(title), Some(url)) = (p.title.captures(body), p.url.captures(body)) else {
                continue;
            };
            let snippet = p
                .passage
                .captures(body)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| clean(m.as_str()))
                .unwrap_or_default();

            results.push(SearchResult {
                title: clean(&title[1]),
                link: decode_html_entities(url[1].trim()),
                snippet,
                source: SearchProviderKind::Yandex.label().to_string(),
                image: None,
            });
        }

        if !results.is_empty() {
            return Ok(results);
        }

        if let Some(error) = p.error.captures(xml) {
            return Err(SearchError::Api {
                provider: SearchProviderKind::Yandex.label(),
                message: error[1].trim().to_string(),
            });
        }
        if xml.contains("<error") {
            return Err(SearchError::Api {
                provider: SearchProviderKind::Yandex.label(),
                message: "Unknown error".to_string(),
            });
        }

        Err(SearchError::NoResults {
            provider: SearchProviderKind::Yandex.label(),
        })
    }
}

impl Default for YandexSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchProvider for YandexSearchProvider {
    fn kind(&self) -> SearchProviderKind {
        SearchProviderKind::Yandex
    }

    async fn search(
        &self,
        query: &str,
        credentials: &SearchCredentials,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let (Some(api_key), Some(user)) = (&credentials.api_key, &credentials.user) else {
            return Err(SearchError::MissingCredentials {
                provider: self.kind().label(),
                fields: "User or Key",
            });
        };

        tracing::debug!(query = %query, "performing yandex search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("user", user.as_str()),
                ("key", api_key.as_str()),
                ("query", query),
                ("l10n", "en"),
                ("sortby", "rlv"),
                ("filter", "none"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "yandex search api error");
            return Err(SearchError::http(self.kind(), status));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        Self::parse_response(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<yandexsearch version="1.0"><response><results><grouping>
  <group><doc id="1">
    <url>https://example.ru/solaris</url>
    <title><hlword>Solaris</hlword> (1972) &amp; its legacy</title>
    <headline>Tarkovsky's <hlword>Solaris</hlword></headline>
  </doc></group>
  <group><doc id="2">
    <url>https://example.ru/stalker</url>
    <title>Stalker</title>
  </doc></group>
</grouping></results></response></yandexsearch>"#;

    #[test]
    fn test_parse_docs_strips_markup() {
        let results = YandexSearchProvider::parse_response(SAMPLE).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Solaris (1972) & its legacy");
        assert_eq!(results[0].link, "https://example.ru/solaris");
        assert_eq!(results[0].snippet, "Tarkovsky's Solaris");
        assert_eq!(results[1].snippet, "");
        assert!(results.iter().all(|r| r.image.is_none()));
    }

    #[test]
    fn test_url_entities_are_decoded() {
        let xml = r#"<doc><url>https://example.ru/film?id=7&amp;lang=en</url><title>Mirror</title></doc>"#;
        let results = YandexSearchProvider::parse_response(xml).unwrap();
        assert_eq!(results[0].link, "https://example.ru/film?id=7&lang=en");
    }

    #[test]
    fn test_error_tag_is_surfaced_verbatim() {
        let xml = r#"<yandexsearch><response><error code="32">Limit of requests exceeded</error></response></yandexsearch>"#;
        let err = YandexSearchProvider::parse_response(xml).unwrap_err();
        assert_eq!(err.to_string(), "Yandex API Error: Limit of requests exceeded");
    }

    #[test]
    fn test_empty_document_is_no_results() {
        let err = YandexSearchProvider::parse_response("<yandexsearch/>").unwrap_err();
        assert_eq!(err.to_string(), "No Yandex results found.");
    }

    #[tokio::test]
    async fn test_missing_user_is_configuration_error() {
        let provider = YandexSearchProvider::new().with_endpoint("http://127.0.0.1:9/never");
        let creds = SearchCredentials {
            api_key: Some("k".to_string()),
            ..SearchCredentials::default()
        };
        let err = provider.search("Solaris", &creds).await.unwrap_err();
        assert_eq!(err.to_string(), "Error: Yandex Search configuration missing (User or Key)");
    }
}
