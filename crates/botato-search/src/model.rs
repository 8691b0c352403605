//! Search Result Models
//!
//! Results are rendered as `<Document .../>` blocks that the model reads as tool
//! output.

use serde::{Deserialize, Serialize};

/// Separator between rendered documents
pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

/// A web page returned by a web search backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebDocument {
    pub url: String,
    pub content: String,
}

impl WebDocument {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("<Document href=\"{}\"/>\n{}\n</Document>", self.url, self.content)
    }
}

/// An encyclopedia page returned by an encyclopedia backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiDocument {
    /// Canonical page URL
    pub source: String,

    /// Page title. Generic Wikipedia loaders render `page=""`; this one
    /// always fills in the title.
    pub page: String,

    pub content: String,
}

impl WikiDocument {
    pub fn new(
        source: impl Into<String>,
        page: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            page: page.into(),
            content: content.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "<Document source=\"{}\" page=\"{}\"/>\n{}\n</Document>",
            self.source, self.page, self.content
        )
    }
}

/// Render and join documents in order
pub fn join_documents<I>(rendered: I) -> String
where
    I: IntoIterator<Item = String>,
{
    rendered.into_iter().collect::<Vec<_>>().join(DOCUMENT_SEPARATOR)
}

/// Cut `text` to at most `max_chars` characters, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
