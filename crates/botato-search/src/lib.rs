//! # botato-search
//!
//! Search tools for the botato agent: `web_search` over the Tavily API and
//! `wiki_search` over the MediaWiki action API.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌───────────────┐
//! │ WebSearchTool│────▶│ WebSearchProvider  │────▶│ Tavily        │
//! └──────────────┘     └────────────────────┘     └───────────────┘
//! ┌──────────────┐     ┌────────────────────┐     ┌───────────────┐
//! │WikiSearchTool│────▶│EncyclopediaProvider│────▶│ MediaWiki API │
//! └──────────────┘     └────────────────────┘     └───────────────┘
//! ```
//!
//! Both tools swallow backend errors and answer with a fixed apology, so a
//! search outage never aborts a conversation turn.

pub mod backend;
pub mod error;
pub mod model;
pub mod svckit;

pub use backend::{EncyclopediaProvider, WebSearchProvider};
pub use error::{Result, SearchError};
pub use model::{WebDocument, WikiDocument};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{WebSearchTool, WikiSearchTool};
}
