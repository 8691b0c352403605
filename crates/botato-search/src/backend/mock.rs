//! Mock Search Backends
//!
//! Static results for tests and offline demos.

use async_trait::async_trait;

use super::{EncyclopediaProvider, WebSearchProvider};
use crate::error::{Result, SearchError};
use crate::model::{WebDocument, WikiDocument};

/// Web backend that returns a fixed list or always fails
#[derive(Default)]
pub struct MockWebSearch {
    documents: Vec<WebDocument>,
    fail: bool,
}

impl MockWebSearch {
    pub fn new(documents: Vec<WebDocument>) -> Self {
        Self {
            documents,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            documents: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl WebSearchProvider for MockWebSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<WebDocument>> {
        if self.fail {
            return Err(SearchError::Api {
                status: 503,
                body: "mock outage".into(),
            });
        }
        Ok(self.documents.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Encyclopedia backend that returns a fixed list or always fails
#[derive(Default)]
pub struct MockEncyclopedia {
    documents: Vec<WikiDocument>,
    fail: bool,
}

impl MockEncyclopedia {
    pub fn new(documents: Vec<WikiDocument>) -> Self {
        Self {
            documents,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            documents: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl EncyclopediaProvider for MockEncyclopedia {
    async fn lookup(&self, _query: &str, max_docs: usize) -> Result<Vec<WikiDocument>> {
        if self.fail {
            return Err(SearchError::Malformed("mock outage".into()));
        }
        Ok(self.documents.iter().take(max_docs).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
