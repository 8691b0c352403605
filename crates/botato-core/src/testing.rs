//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, FinishReason, GenerationOptions, InferenceClient};
use crate::tool::{Tool, ToolCall, ToolSchema};

fn schema(name: &str) -> ToolSchema {
    ToolSchema::new(name, format!("Test tool {}", name), "input", "The query.")
}

/// Returns `echo: <input>`
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn named(name: &str) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn schema(&self) -> ToolSchema {
        schema(&self.name)
    }

    async fn execute(&self, input: &str) -> Result<String> {
        Ok(format!("echo: {}", input))
    }
}

/// Always fails
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub const APOLOGY: &'static str = "Error occurred while searching the web. Please try again.";

    pub fn named(name: &str) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn schema(&self) -> ToolSchema {
        schema(&self.name)
    }

    async fn execute(&self, _input: &str) -> Result<String> {
        Err(AgentError::ToolExecution("upstream returned 500".into()))
    }

    fn failure_message(&self) -> String {
        Self::APOLOGY.into()
    }
}

/// Sleeps before answering `<name>: <input>`
pub struct SlowTool {
    name: String,
    delay: Duration,
}

impl SlowTool {
    pub fn new(name: &str, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn schema(&self) -> ToolSchema {
        schema(&self.name)
    }

    async fn execute(&self, input: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("{}: {}", self.name, input))
    }
}

/// Signals `started`, then blocks until `release` is notified
pub struct GatedTool {
    name: String,
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedTool {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Tool for GatedTool {
    fn schema(&self) -> ToolSchema {
        schema(&self.name)
    }

    async fn execute(&self, input: &str) -> Result<String> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(format!("{}: {}", self.name, input))
    }
}

/// Never completes
pub struct HangingTool;

#[async_trait]
impl Tool for HangingTool {
    fn schema(&self) -> ToolSchema {
        schema("hang")
    }

    async fn execute(&self, _input: &str) -> Result<String> {
        std::future::pending().await
    }
}

/// Tool-call request with `input` arguments
pub fn tool_request(calls: &[(&str, &str, &str)]) -> Message {
    let calls = calls
        .iter()
        .map(|(id, name, input)| ToolCall::new(*id, *name).with_argument("input", *input))
        .collect();
    Message::assistant_with_tool_calls("", calls)
}

/// Inference client that replays queued replies and records what it was shown
#[derive(Default)]
pub struct ScriptedInference {
    replies: Mutex<VecDeque<Result<Message>>>,
    seen: Mutex<Vec<Vec<Message>>>,
    system_prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, message: Message) -> Self {
        self.replies.lock().unwrap().push_back(Ok(message));
        self
    }

    pub fn fail(self, err: AgentError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    /// Histories passed to each call, in call order
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn infer(
        &self,
        system_prompt: &str,
        history: &[Message],
        _tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.system_prompts.lock().unwrap().push(system_prompt.to_string());

        let next = self.replies.lock().unwrap().pop_front();
        let message = next.unwrap_or_else(|| Err(AgentError::Inference("script exhausted".into())))?;
        let finish_reason = if message.tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolCalls
        };

        Ok(Completion {
            message,
            model: options.model.clone(),
            usage: None,
            finish_reason: Some(finish_reason),
        })
    }
}

/// Stateless client: asks `web_search` about the latest user message, then
/// answers with whatever the tool returned. Safe to share across threads.
pub struct MirrorInference;

#[async_trait]
impl InferenceClient for MirrorInference {
    fn name(&self) -> &str {
        "mirror"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn infer(
        &self,
        _system_prompt: &str,
        history: &[Message],
        _tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let last = history
            .last()
            .ok_or_else(|| AgentError::Inference("empty history".into()))?;

        let message = match last.role {
            crate::message::Role::Tool => Message::assistant(format!("answer: {}", last.content)),
            _ => tool_request(&[("call", "web_search", last.content.as_str())]),
        };

        Ok(Completion {
            message,
            model: options.model.clone(),
            usage: None,
            finish_reason: None,
        })
    }
}

/// Never answers
pub struct HangingInference;

#[async_trait]
impl InferenceClient for HangingInference {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    async fn infer(
        &self,
        _system_prompt: &str,
        _history: &[Message],
        _tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        std::future::pending().await
    }
}
