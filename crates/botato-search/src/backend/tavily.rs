//! Tavily Web Search
//!
//! Client for the Tavily search API, which returns ranked pages with an
//! extracted content snippet per page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::WebSearchProvider;
use crate::error::{Result, SearchError};
use crate::model::WebDocument;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tavily client configuration
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl TavilyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `TAVILY_API_KEY` and `TAVILY_BASE_URL`; `None` when no key is set
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("TAVILY_API_KEY").ok().filter(|k| !k.is_empty())?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("TAVILY_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        Some(config)
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    content: String,
}

/// Tavily search client
pub struct TavilyClient {
    client: Client,
    config: TavilyConfig,
}

impl TavilyClient {
    pub fn new(config: TavilyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl WebSearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebDocument>> {
        let url = format!("{}/search", self.config.base_url);
        tracing::debug!(query, max_results, "Tavily search");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "query": query,
                "max_results": max_results,
                "search_depth": "basic",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, body });
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| WebDocument::new(r.url, r.content))
            .collect())
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TavilyClient {
        let mut config = TavilyConfig::new("tvly-test");
        config.base_url = server.uri();
        TavilyClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-test"))
            .and(body_partial_json(json!({ "query": "weather in Paris", "max_results": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "weather in Paris",
                "results": [
                    { "title": "Paris", "url": "https://weather.example/paris", "content": "Sunny", "score": 0.9 },
                    { "title": "Forecast", "url": "https://forecast.example/paris", "content": "Clouds later", "score": 0.7 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let docs = client_for(&server).search("weather in Paris", 3).await.unwrap();
        assert_eq!(
            docs,
            vec![
                WebDocument::new("https://weather.example/paris", "Sunny"),
                WebDocument::new("https://forecast.example/paris", "Clouds later"),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_caps_results() {
        let server = MockServer::start().await;
        let results: Vec<_> = (0..5)
            .map(|i| json!({ "url": format!("https://r{}.example", i), "content": "x" }))
            .collect();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(&server)
            .await;

        let docs = client_for(&server).search("q", 3).await.unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let err = client_for(&server).search("q", 3).await.unwrap_err();
        assert!(matches!(err, SearchError::Api { status: 401, .. }));
    }
}
