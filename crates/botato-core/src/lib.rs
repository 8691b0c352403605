//! # botato-core
//!
//! Tool-calling agent loop with pluggable inference, tools and conversation storage.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         SessionManager                           │
//! │  ┌──────────────────────────────────────────────────────────┐    │
//! │  │                      Agent (loop)                        │    │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌────────────────┐  │    │
//! │  │  │ ToolRegistry │  │ Conversation │  │ Inference      │  │    │
//! │  │  │              │  │ Store        │  │ Client         │  │    │
//! │  │  └──────────────┘  └──────────────┘  └────────────────┘  │    │
//! │  └──────────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `InferenceClient` trait lets the loop run against OpenAI, any
//! OpenAI-compatible server, or a scripted client without changing agent logic.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod store;
pub mod thread;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AgentError, Result};
pub use message::{Message, MessageMetadata, Role};
pub use provider::{Completion, GenerationOptions, InferenceClient};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use session::SessionManager;
pub use store::{ConversationStore, FileConversationStore, MemoryConversationStore};
pub use thread::{Thread, ThreadId};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
