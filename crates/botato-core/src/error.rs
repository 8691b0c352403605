//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// The model call failed or returned a malformed response
    #[error("Inference error: {0}")]
    Inference(String),

    /// Inference endpoint unavailable or not responding
    #[error("Inference service unavailable: {0}")]
    InferenceUnavailable(String),

    /// Inference call exceeded its deadline
    #[error("Inference timed out after {0:?}")]
    InferenceTimeout(Duration),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool name registered twice
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// Tool arguments do not match the declared schema
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool implementation failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Thread id was never created
    #[error("Unknown thread: {0}")]
    UnknownThread(String),

    /// Append would break the history invariants
    #[error("Invalid history: {0}")]
    InvalidHistory(String),

    /// Too many tool round-trips in one turn
    #[error("Tool round-trip limit ({0}) exceeded")]
    LoopLimitExceeded(usize),

    /// Storage backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::InferenceUnavailable(_)
                | AgentError::InferenceTimeout(_)
                | AgentError::RateLimited(_)
                | AgentError::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Inference(_) => "The AI service returned an invalid response. Please try again.".into(),
            AgentError::InferenceUnavailable(_) | AgentError::InferenceTimeout(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            AgentError::UnknownThread(id) => format!("Conversation '{}' does not exist.", id),
            AgentError::LoopLimitExceeded(_) => {
                "The request took too many steps to process. Please try a simpler query.".into()
            }
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            AgentError::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
