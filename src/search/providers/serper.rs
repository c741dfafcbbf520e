use crate::config::SearchProviderKind;
use crate::search::{
    usable_image, SearchCredentials, SearchError, SearchProvider, SearchResult, MAX_RESULTS,
};
use serde_json::json;
use std::time::Duration;

const ENDPOINT: &str = "https://google.serper.dev/search";

/// Serper.dev provider (Google results over a JSON POST API)
pub struct SerperSearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl SerperSearchProvider {
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
        let organic = json["organic"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        if organic.is_empty() {
            return Err(SearchError::NoResults {
                provider: SearchProviderKind::Serper.label(),
            });
        }

        Ok(organic
            .iter()
            .take(MAX_RESULTS)
            .map(|item| SearchResult {
                title: item["title"].as_str().unwrap_or("").to_string(),
                link: item["link"].as_str().unwrap_or("").to_string(),
                snippet: item["snippet"].as_str().unwrap_or("").to_string(),
                source: SearchProviderKind::Serper.label().to_string(),
                image: usable_image(item["imageUrl"].as_str()),
            })
            .collect())
    }
}

impl Default for SerperSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchProvider for SerperSearchProvider {
    fn kind(&self) -> SearchProviderKind {
        SearchProviderKind::Serper
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

        tracing::debug!(query = %query, "performing serper search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %error_text, "serper search api error");
            return Err(SearchError::http(self.kind(), status));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::network(self.kind(), e))?;

        let items = Self::parse_response(&json)?;
        tracing::debug!(query = %query, result_count = items.len(), "serper search completed");
        Ok(items)
    }
}
