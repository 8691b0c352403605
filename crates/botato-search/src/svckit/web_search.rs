//! Web Search Tool
//!
//! Searches the web and returns up to three pages as `<Document href=.../>` blocks.

use std::sync::Arc;

use async_trait::async_trait;
use botato_core::{Result as CoreResult, Tool, ToolSchema};

use crate::backend::WebSearchProvider;
use crate::model::join_documents;

/// Tool for searching the web
pub struct WebSearchTool {
    backend: Arc<dyn WebSearchProvider>,
}

impl WebSearchTool {
    pub const NAME: &'static str = "web_search";
    pub const MAX_RESULTS: usize = 3;
    pub const APOLOGY: &'static str = "Error occurred while searching the web. Please try again.";

    pub fn new(backend: Arc<dyn WebSearchProvider>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            Self::NAME,
            "Search the web for a query and return maximum 3 results.",
            "input",
            "The search query.",
        )
    }

    async fn execute(&self, input: &str) -> CoreResult<String> {
        match self.backend.search(input, Self::MAX_RESULTS).await {
            Ok(docs) => Ok(join_documents(
                docs.iter().take(Self::MAX_RESULTS).map(|d| d.render()),
            )),
            Err(e) => {
                tracing::error!(backend = self.backend.name(), error = %e, "Web search failed");
                Ok(Self::APOLOGY.into())
            }
        }
    }

    fn failure_message(&self) -> String {
        Self::APOLOGY.into()
    }
}
