//! Inference Client Strategy Pattern
//!
//! Defines a common interface for the hosted model the agent talks to, so the
//! loop can work against OpenAI, an OpenAI-compatible server, or a scripted
//! client in tests without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botato_core::provider::{GenerationOptions, InferenceClient};
//!
//! let completion = client
//!     .infer(system_prompt, &history, &registry.describe(), &GenerationOptions::default())
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Message, MessageMetadata};
use crate::tool::ToolSchema;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate; provider default when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// Response from one inference call
#[derive(Clone, Debug)]
pub struct Completion {
    /// The assistant message: final content or tool calls
    pub message: Message,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// The assistant message with model and usage attached
    pub fn into_message(self) -> Message {
        let metadata = MessageMetadata {
            model: Some(self.model),
            usage: self.usage,
        };
        self.message.with_metadata(metadata)
    }
}

/// Token usage statistics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

impl FinishReason {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(FinishReason::Stop),
            "length" => Some(FinishReason::Length),
            "tool_calls" | "function_call" => Some(FinishReason::ToolCalls),
            "content_filter" => Some(FinishReason::ContentFilter),
            _ => None,
        }
    }
}

/// Strategy trait for inference backends
///
/// Implement this trait to add support for new model services.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Backend name for logs (e.g. "openai")
    fn name(&self) -> &str;

    /// Check if the service is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Run one model call over the full history.
    ///
    /// `system_prompt` is sent ahead of `history` on every call; it is never part
    /// of the stored thread.
    async fn infer(
        &self,
        system_prompt: &str,
        history: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}
