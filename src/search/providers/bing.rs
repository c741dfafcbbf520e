use crate::config::SearchProviderKind;
use crate::search::{
    usable_image, SearchCredentials, SearchError, SearchProvider, SearchResult, MAX_RESULTS,
};
use std::time::Duration;

const ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Bing Web Search v7 provider
pub struct BingSearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl BingSearchProvider {
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

    pub fn parse_response(json: &serde_json::Value) -> Result<Vec<SearchResult>, SearchError> {
        let pages = json["webPages"]["value"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if pages.is_empty() {
            return Err(SearchError::NoResults {
                provider: SearchProviderKind::Bing.label(),
            });
        }

        Ok(pages
            .iter()
            .take(MAX_RESULTS)
            .map(|page| SearchResult {
                title: page["name"].as_str().unwrap_or("").to_string(),
                link: page["url"].as_str().unwrap_or("").to_string(),
                snippet: page["snippet"].as_str().unwrap_or("").to_string(),
                source: SearchProviderKind::Bing.label().to_string(),
                image: usable_image(page["openGraphImage"]["contentUrl"].as_str()),
            })
            .collect())
    }
}

impl Default for BingSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchProvider for BingSearchProvider {
    fn kind(&self) -> SearchProviderKind {
        SearchProviderKind::Bing
    }

    fn supports_images(&self) -> bool {
        true
    }

    async fn search(
        &self,
        query: &str,
        credentials: &SearchCredentials,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let Some(api_key) = &credentials.api_key else {
            return Err(SearchError::MissingCredentials {
                provider: self.kind().label(),
                fields: "API Key",
            });
        };

        tracing::debug!(query = %query, "performing bing search");

        let count = MAX_RESULTS.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "bing search api error");
            return Err(SearchError::http(self.kind(), status));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        Self::parse_response(&json)
    }
}
