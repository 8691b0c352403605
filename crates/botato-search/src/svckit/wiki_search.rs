//! Wikipedia Search Tool
//!
//! Looks up up to two encyclopedia pages and returns them as
//! `<Document source=... page=.../>` blocks.

use std::sync::Arc;

use async_trait::async_trait;
use botato_core::{Result as CoreResult, Tool, ToolSchema};

use crate::backend::EncyclopediaProvider;
use crate::model::join_documents;

/// Tool for searching Wikipedia
pub struct WikiSearchTool {
    backend: Arc<dyn EncyclopediaProvider>,
}

impl WikiSearchTool {
    pub const NAME: &'static str = "wiki_search";
    pub const MAX_RESULTS: usize = 2;
    pub const APOLOGY: &'static str = "Error occurred while searching Wikipedia. Please try again.";

    pub fn new(backend: Arc<dyn EncyclopediaProvider>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WikiSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            Self::NAME,
            "Search Wikipedia for a query and return maximum 2 results.",
            "input",
            "The search query.",
        )
    }

    async fn execute(&self, input: &str) -> CoreResult<String> {
        match self.backend.lookup(input, Self::MAX_RESULTS).await {
            Ok(docs) => Ok(join_documents(
                docs.iter().take(Self::MAX_RESULTS).map(|d| d.render()),
            )),
            Err(e) => {
                tracing::error!(backend = self.backend.name(), error = %e, "Wikipedia search failed");
                Ok(Self::APOLOGY.into())
            }
        }
    }

    fn failure_message(&self) -> String {
        Self::APOLOGY.into()
    }
}
