use crate::config::SearchProviderKind;
use crate::search::{
    decode_html_entities, SearchCredentials, SearchError, SearchProvider, SearchResult,
    MAX_RESULTS,
};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// The HTML endpoint rejects requests that do not look like a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BLOCK_MARKER: &str = "result__body";
const TITLE_MARKER: &str = "class=\"result__a\"";
const SNIPPET_MARKER: &str = "class=\"result__snippet\"";

/// Keyless DuckDuckGo provider scraping the HTML results page
pub struct DuckDuckGoSearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

struct HtmlPatterns {
    href: Regex,
    anchor_text: Regex,
    tag: Regex,
}

fn patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HtmlPatterns {
        href: Regex::new(r#"href="(.*?)""#).expect("valid regex"),
        anchor_text: Regex::new(r"(?s)>(.*?)</a>").expect("valid regex"),
        tag: Regex::new(r"<[^>]+>").expect("valid regex"),
    })
}

impl DuckDuckGoSearchProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent(BROWSER_USER_AGENT)
                .build()
                .unwrap_or_default(),
            endpoint: ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Split the page on result blocks and pull link, title and snippet out of each.
    pub fn parse_results(html: &str) -> Result<Vec<SearchResult>, SearchError> {
        let p = patterns();
        let text_after = |block: &str, marker: &str| -> Option<String> {
            let (_, rest) = block.split_once(marker)?;
            let raw = p.anchor_text.captures(rest)?;
            Some(decode_html_entities(p.tag.replace_all(&raw[1], "").trim()))
        };

        let mut results = Vec::new();
        for block in html.split(BLOCK_MARKER).skip(1) {
            if results.len() >= MAX_RESULTS {
                break;
            }
            let Some(href) = p.href.captures(block) else {
                continue;
            };
            let Some(title) = text_after(block, TITLE_MARKER) else {
                continue;
            };

            results.push(SearchResult {
                title,
                link: resolve_redirect(&decode_html_entities(&href[1])),
                snippet: text_after(block, SNIPPET_MARKER).unwrap_or_default(),
                source: SearchProviderKind::DuckDuckGo.label().to_string(),
                image: None,
            });
        }

        if results.is_empty() {
            tracing::warn!("duckduckgo parsing found 0 results, markup may have changed");
            return Err(SearchError::ParseFailed {
                provider: SearchProviderKind::DuckDuckGo.label(),
            });
        }
        Ok(results)
    }
}

/// Result links go through `//duckduckgo.com/l/?uddg=<target>`; unwrap to the target.
fn resolve_redirect(link: &str) -> String {
    let absolute = if link.starts_with("//") {
        format!("https:{link}")
    } else {
        link.to_string()
    };
    let Ok(url) = reqwest::Url::parse(&absolute) else {
        return link.to_string();
    };
    if url.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) && url.path() == "/l/" {
        if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
    }
    link.to_string()
}

impl Default for DuckDuckGoSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoSearchProvider {
    fn kind(&self) -> SearchProviderKind {
        SearchProviderKind::DuckDuckGo
    }

    async fn search(
        &self,
        query: &str,
        _credentials: &SearchCredentials,
    ) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!(query = %query, "performing duckduckgo search");

        let response = self
            .client
            .get(&self.endpoint)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "duckduckgo search failed");
            return Err(SearchError::http(self.kind(), status));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        Self::parse_results(&html)
    }
}
