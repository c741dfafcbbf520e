use crate::config::SearchProviderKind;
use crate::search::{
    usable_image, SearchCredentials, SearchError, SearchProvider, SearchResult, MAX_RESULTS,
};
use std::time::Duration;

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Programmable Search (Custom Search JSON API) provider
///
/// Needs both an API key and a search engine id (`cx`).
/// Documentation: https://developers.google.com/custom-search/v1/overview
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleSearchProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            endpoint: ENDPOINT.to_string(),
        }
    }

    /// Point the provider at a different endpoint (proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Normalize a Custom Search response body
    pub fn parse_response(json: &serde_json::Value) -> Result<Vec<SearchResult>, SearchError> {
        let items = json["items"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        if items.is_empty() {
            return Err(SearchError::NoResults {
                provider: SearchProviderKind::Google.label(),
            });
        }

        Ok(items
            .iter()
            .take(MAX_RESULTS)
            .map(|item| SearchResult {
                title: item["title"].as_str().unwrap_or("").to_string(),
                link: item["link"].as_str().unwrap_or("").to_string(),
                snippet: item["snippet"].as_str().unwrap_or("").to_string(),
                source: SearchProviderKind::Google.label().to_string(),
                image: usable_image(item["pagemap"]["cse_image"][0]["src"].as_str()),
            })
            .collect())
    }
}

impl Default for GoogleSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchProvider {
    fn kind(&self) -> SearchProviderKind {
        SearchProviderKind::Google
    }

    fn supports_images(&self) -> bool {
        true
    }

    async fn search(
        &self,
        query: &str,
        credentials: &SearchCredentials,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let (Some(api_key), Some(cx)) = (&credentials.api_key, &credentials.index_id) else {
            return Err(SearchError::MissingCredentials {
                provider: self.kind().label(),
                fields: "API Key or CX",
            });
        };

        tracing::debug!(query = %query, "performing google search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", api_key.as_str()), ("cx", cx.as_str()), ("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                error = %crate::logging::redact_secrets(&error_text),
                "google search api error"
            );
            return Err(SearchError::http(self.kind(), status));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        let items = Self::parse_response(&json)?;
        tracing::debug!(query = %query, result_count = items.len(), "google search completed");
        Ok(items)
    }
}
