pub mod dispatcher;
pub mod providers;

pub use dispatcher::{SearchDispatcher, SearchOutcome};

use crate::config::SearchProviderKind;
use serde::{Deserialize, Serialize};

/// Upper bound on records any adapter returns.
pub const MAX_RESULTS: usize = 5;

/// Image hosts that serve pages rather than hotlinkable images.
const BLOCKED_IMAGE_HOSTS: &[&str] = &["instagram.com", "facebook.com", "twitter.com", "x.com"];

/// Search provider abstraction - one implementation per engine.
///
/// Adapters never panic and never leak transport errors as anything other than a
/// `SearchError`, whose `Display` text is what the model and operators see.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Which engine this adapter talks to
    fn kind(&self) -> SearchProviderKind;

    /// Whether results can carry an image URL usable as a poster
    fn supports_images(&self) -> bool {
        false
    }

    /// Run a query and normalize the engine's response
    async fn search(
        &self,
        query: &str,
        credentials: &SearchCredentials,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Credentials for one search engine, taken from the config snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCredentials {
    pub api_key: Option<String>,
    /// Secondary index id for curated-index engines (Google `cx`)
    pub index_id: Option<String>,
    /// Account login for engines that need one (Yandex `user`)
    pub user: Option<String>,
}

/// Individual search result, identical in shape for every engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Provider label, e.g. "Google"
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Search-related errors. The display strings are surfaced verbatim to the model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Error: {provider} Search configuration missing ({fields})")]
    MissingCredentials {
        provider: &'static str,
        fields: &'static str,
    },

    #[error("{provider} Search failed: {status}")]
    Http { provider: &'static str, status: String },

    #[error("{provider} Search error: {message}")]
    Network { provider: &'static str, message: String },

    #[error("No {provider} results found.")]
    NoResults { provider: &'static str },

    #[error("No {provider} results found (parsing may have failed or no results).")]
    ParseFailed { provider: &'static str },

    #[error("{provider} API Error: {message}")]
    Api { provider: &'static str, message: String },
}

impl SearchError {
    pub(crate) fn network(kind: SearchProviderKind, err: reqwest::Error) -> Self {
        SearchError::Network {
            provider: kind.label(),
            message: crate::logging::redact_secrets(&err.to_string()),
        }
    }

    pub(crate) fn http(kind: SearchProviderKind, status: reqwest::StatusCode) -> Self {
        SearchError::Http {
            provider: kind.label(),
            status: status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string()),
        }
    }
}

/// True when an image URL points at a social-media host.
pub fn is_blocked_image_host(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let host = lower
        .split("://")
        .nth(1)
        .unwrap_or(lower.as_str())
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .rsplit('@')
        .next()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("");
    BLOCKED_IMAGE_HOSTS
        .iter()
        .any(|blocked| host == *blocked || host.ends_with(&format!(".{blocked}")))
}

/// Keep an image URL only if it is non-empty and not on a blocked host.
pub(crate) fn usable_image(url: Option<&str>) -> Option<String> {
    let url = url?.trim();
    if url.is_empty() || is_blocked_image_host(url) {
        return None;
    }
    Some(url.to_string())
}

/// Decode the handful of entities search engines emit in titles and snippets.
pub fn decode_html_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_image_hosts() {
        assert!(is_blocked_image_host("https://www.instagram.com/p/abc"));
        assert!(is_blocked_image_host("https://x.com/someone/status/1"));
        assert!(is_blocked_image_host("http://FACEBOOK.com/photo.jpg"));
        assert!(!is_blocked_image_host("https://m.media-amazon.com/images/poster.jpg"));
        assert!(is_blocked_image_host("https://x.com:443/a.jpg"));
        assert!(is_blocked_image_host("https://user@www.facebook.com:8443/a.jpg"));
        // Host matching, not substring matching
        assert!(!is_blocked_image_host("https://cdn.box.com/poster.png"));
    }

    #[test]
    fn test_usable_image_rejects_empty_and_social() {
        assert_eq!(usable_image(None), None);
        assert_eq!(usable_image(Some("  ")), None);
        assert_eq!(usable_image(Some("https://twitter.com/a.jpg")), None);
        assert_eq!(
            usable_image(Some("https://img.example.org/a.jpg")),
            Some("https://img.example.org/a.jpg".to_string())
        );
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(
            decode_html_entities("Tom &amp; Jerry &lt;1940&gt; &quot;cat&quot; &#39;mouse&#39;"),
            "Tom & Jerry <1940> \"cat\" 'mouse'"
        );
        // Decoding happens once
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_error_strings() {
        let err = SearchError::MissingCredentials {
            provider: "Google",
            fields: "API Key or CX",
        };
        assert_eq!(err.to_string(), "Error: Google Search configuration missing (API Key or CX)");
        assert_eq!(
            SearchError::NoResults { provider: "Bing" }.to_string(),
            "No Bing results found."
        );
    }
}
