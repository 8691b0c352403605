//! Conversation Threads
//!
//! A thread is one persisted conversation: an opaque id plus its append-only
//! message history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::{Message, Role};
use crate::tool::ToolCall;

/// Unique thread identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has the shape this crate generates
    pub fn is_well_formed(&self) -> bool {
        Uuid::parse_str(&self.0).is_ok()
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One conversation and its history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Thread {
    /// Unique identifier
    pub id: ThreadId,

    history: Vec<Message>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last append timestamp
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Create an empty thread with a fresh id
    pub fn new() -> Self {
        Self::with_id(ThreadId::new())
    }

    /// Create an empty thread with a specific id
    pub fn with_id(id: ThreadId) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a thread from previously persisted messages, re-checking every append
    pub fn restore(id: ThreadId, messages: Vec<Message>) -> Result<Self> {
        let mut thread = Self::with_id(id);
        if let Some(first) = messages.first() {
            thread.created_at = first.timestamp;
        }
        for message in messages {
            thread.append(message)?;
        }
        Ok(thread)
    }

    /// Check that `message` may follow the current history
    pub fn check_append(&self, message: &Message) -> Result<()> {
        match message.role {
            Role::Tool => {
                let call_id = message.tool_call_id.as_deref().ok_or_else(|| {
                    AgentError::InvalidHistory("tool message without tool_call_id".into())
                })?;
                if self.find_tool_call(call_id).is_none() {
                    return Err(AgentError::InvalidHistory(format!(
                        "tool message answers unknown call '{}'",
                        call_id
                    )));
                }
            }
            Role::User | Role::Assistant => {
                if message.tool_call_id.is_some() {
                    return Err(AgentError::InvalidHistory(format!(
                        "{} message carries a tool_call_id",
                        message.role
                    )));
                }
                if message.role == Role::User && !message.tool_calls.is_empty() {
                    return Err(AgentError::InvalidHistory("user message carries tool calls".into()));
                }
            }
        }
        Ok(())
    }

    /// Append a message, enforcing history invariants
    pub fn append(&mut self, message: Message) -> Result<()> {
        self.check_append(&message)?;
        self.history.push(message);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    /// Message count
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn find_tool_call(&self, call_id: &str) -> Option<&ToolCall> {
        self.history
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .flat_map(|m| m.tool_calls.iter())
            .find(|c| c.id == call_id)
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool calls of the trailing assistant message that have no result yet.
///
/// Non-empty only when a turn was interrupted mid-batch.
pub fn unanswered_tool_calls(history: &[Message]) -> Vec<ToolCall> {
    let Some(pos) = history.iter().rposition(|m| m.role != Role::Tool) else {
        return Vec::new();
    };
    let request = &history[pos];
    if !request.has_tool_calls() {
        return Vec::new();
    }

    let answered: Vec<&str> = history[pos + 1..]
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();

    request
        .tool_calls
        .iter()
        .filter(|c| !answered.contains(&c.id.as_str()))
        .cloned()
        .collect()
}
