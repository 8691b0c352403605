//! Service Kit - Agent Tools
//!
//! Search tools that implement `botato_core::Tool`.

mod web_search;
mod wiki_search;

pub use web_search::WebSearchTool;
pub use wiki_search::WikiSearchTool;
