//! # botato-runtime
//!
//! Inference clients for the botato agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): the Chat Completions API with native tool calling.
//!   Any OpenAI-compatible server (a local Ollama at `http://localhost:11434/v1`,
//!   vLLM, LM Studio) works by pointing `OPENAI_BASE_URL` at it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botato_runtime::openai::{OpenAiClient, OpenAiConfig};
//!
//! let client = OpenAiClient::new(OpenAiConfig::from_env()?)?;
//! let agent = AgentBuilder::new()
//!     .inference(Arc::new(client))
//!     .build()?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiClient, OpenAiConfig};

// Re-export core types for convenience
pub use botato_core::{
    Agent, AgentError, InferenceClient, Message, Result, Role, SessionManager, Tool, ToolRegistry,
};
