//! Error Types for Search Backends

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected search response: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
