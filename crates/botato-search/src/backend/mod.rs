//! Search Backends
//!
//! Abstractions over the services the search tools query.

mod mock;
mod tavily;
mod wikipedia;

pub use mock::{MockEncyclopedia, MockWebSearch};
pub use tavily::{TavilyClient, TavilyConfig};
pub use wikipedia::{WikipediaClient, WikipediaConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{WebDocument, WikiDocument};

/// Web search backend (Strategy pattern)
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Search the web, returning at most `max_results` pages
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebDocument>>;

    /// Backend name
    fn name(&self) -> &str;
}

/// Encyclopedia backend (Strategy pattern)
#[async_trait]
pub trait EncyclopediaProvider: Send + Sync {
    /// Look up pages, returning at most `max_docs` in relevance order
    async fn lookup(&self, query: &str, max_docs: usize) -> Result<Vec<WikiDocument>>;

    /// Backend name
    fn name(&self) -> &str;
}
