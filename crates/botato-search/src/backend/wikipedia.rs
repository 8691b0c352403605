//! Wikipedia Lookup
//!
//! Client for the MediaWiki action API: a full-text search picks the page
//! titles, then each page's plain-text extract and canonical URL is fetched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::EncyclopediaProvider;
use crate::error::{Result, SearchError};
use crate::model::{truncate_chars, WikiDocument};

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Characters kept per page
pub const DEFAULT_MAX_CHARS: usize = 4000;

/// Wikipedia client configuration
#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub api_url: String,
    pub max_chars: usize,
    pub timeout_secs: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            max_chars: DEFAULT_MAX_CHARS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl WikipediaConfig {
    /// Read `WIKIPEDIA_API_URL`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(api_url) = std::env::var("WIKIPEDIA_API_URL") {
            config.api_url = api_url;
        }
        config
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// MediaWiki client
pub struct WikipediaClient {
    client: Client,
    config: WikipediaConfig,
}

impl WikipediaClient {
    pub fn new(config: WikipediaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("botato/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, params: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))
    }

    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .get(&[("list", "search"), ("srsearch", query), ("srlimit", &limit)])
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn fetch_page(&self, title: &str) -> Result<Option<WikiDocument>> {
        let response: PageResponse = self
            .get(&[
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;

        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing);

        Ok(page.map(|p| {
            let content = p.extract.unwrap_or_default();
            let source = p.fullurl.unwrap_or_default();
            WikiDocument::new(source, p.title, truncate_chars(&content, self.config.max_chars))
        }))
    }
}

#[async_trait]
impl EncyclopediaProvider for WikipediaClient {
    async fn lookup(&self, query: &str, max_docs: usize) -> Result<Vec<WikiDocument>> {
        tracing::debug!(query, max_docs, "Wikipedia lookup");

        let titles = self.search_titles(query, max_docs).await?;
        let mut documents = Vec::with_capacity(titles.len());
        for title in titles.iter().take(max_docs) {
            if let Some(doc) = self.fetch_page(title).await? {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}
