//! Agent Loop
//!
//! Drives one user turn through the model/tool cycle:
//!
//! ```text
//!            ┌──────────────── tool results appended ────────────────┐
//!            ▼                                                       │
//!   AWAITING_MODEL ── reply has tool calls ──► EXECUTING_TOOLS ──────┘
//!            │
//!            └── reply is a final answer ──► DONE
//! ```
//!
//! Every message is written to the [`ConversationStore`] before the loop moves on,
//! so an interrupted turn leaves exactly the work it finished behind.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::message::{Message, Role};
use crate::provider::{GenerationOptions, InferenceClient};
use crate::store::{ConversationStore, MemoryConversationStore};
use crate::thread::{unanswered_tool_calls, ThreadId};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolSchema};

/// Default model deadline
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt, fixed for the life of the process
    pub system_prompt: String,

    /// Tool batches allowed per turn before giving up
    pub max_tool_round_trips: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Deadline for a single model call
    pub inference_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_tool_round_trips: 10,
            generation: GenerationOptions::default(),
            inference_timeout: Some(DEFAULT_INFERENCE_TIMEOUT),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Use the search tools when a question needs current or encyclopedic facts, \
then answer concisely based on what they return.";

enum TurnState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Done(String),
}

/// The main Agent struct
#[derive(Clone)]
pub struct Agent {
    inference: Arc<dyn InferenceClient>,
    tools: Arc<ToolRegistry>,
    store: Arc<dyn ConversationStore>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn ConversationStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            inference,
            tools,
            store,
            config,
        }
    }

    /// Run one user turn on `thread_id` and return the final answer.
    ///
    /// Callers must not run two turns on the same thread at once; `SessionManager`
    /// serializes them.
    pub async fn run_turn(&self, thread_id: &ThreadId, user_text: &str) -> Result<String> {
        let mut history = self.store.history(thread_id).await?;
        self.recover_interrupted(thread_id, &mut history).await?;

        info!(thread_id = %thread_id, "Received question: {}", user_text);
        self.record(thread_id, &mut history, Message::user(user_text)).await?;

        let tool_schemas = self.tools.describe();
        let mut round_trips = 0usize;
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    let reply = self.call_model(thread_id, &history, &tool_schemas).await?;

                    if reply.tool_calls.is_empty() {
                        let answer = reply.content.clone();
                        self.record(thread_id, &mut history, reply).await?;
                        TurnState::Done(answer)
                    } else {
                        if round_trips >= self.config.max_tool_round_trips {
                            warn!(
                                thread_id = %thread_id,
                                limit = self.config.max_tool_round_trips,
                                "Tool round-trip limit reached, aborting turn"
                            );
                            return Err(AgentError::LoopLimitExceeded(self.config.max_tool_round_trips));
                        }
                        round_trips += 1;

                        let calls = reply.tool_calls.clone();
                        self.record(thread_id, &mut history, reply).await?;
                        TurnState::ExecutingTools(calls)
                    }
                }
                TurnState::ExecutingTools(calls) => {
                    for call in &calls {
                        debug!(thread_id = %thread_id, tool = %call.name, round_trip = round_trips, "Executing tool");
                        let output = self.execute_tool(call).await?;
                        self.record(thread_id, &mut history, Message::tool(output, &call.id)).await?;
                    }
                    TurnState::AwaitingModel
                }
                TurnState::Done(answer) => {
                    info!(thread_id = %thread_id, round_trips, "Received response from assistant: {}", answer);
                    return Ok(answer);
                }
            };
        }
    }

    /// Persist, then mirror into the turn's working copy
    async fn record(&self, thread_id: &ThreadId, history: &mut Vec<Message>, message: Message) -> Result<()> {
        self.store.append(thread_id, message.clone()).await?;
        history.push(message);
        Ok(())
    }

    /// Close out tool calls left unanswered by an interrupted turn
    async fn recover_interrupted(&self, thread_id: &ThreadId, history: &mut Vec<Message>) -> Result<()> {
        for call in unanswered_tool_calls(history) {
            warn!(thread_id = %thread_id, tool = %call.name, call_id = %call.id, "Answering tool call left by an interrupted turn");
            let output = match self.tools.get(&call.name) {
                Some(tool) => tool.failure_message(),
                None => self.unknown_tool_message(&call.name),
            };
            self.record(thread_id, history, Message::tool(output, &call.id)).await?;
        }
        Ok(())
    }

    async fn call_model(
        &self,
        thread_id: &ThreadId,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<Message> {
        info!(thread_id = %thread_id, messages = history.len(), "Invoking assistant");

        let call = self
            .inference
            .infer(&self.config.system_prompt, history, tools, &self.config.generation);

        let completion = match self.config.inference_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AgentError::InferenceTimeout(limit))??,
            None => call.await?,
        };

        check_reply(&completion.message)?;
        Ok(completion.into_message())
    }

    async fn execute_tool(&self, call: &ToolCall) -> Result<String> {
        match self.tools.invoke(&call.name, &call.arguments).await {
            Ok(result) => Ok(result.output),
            Err(AgentError::UnknownTool(name)) => {
                warn!(tool = %name, "Model requested an unregistered tool");
                Ok(self.unknown_tool_message(&name))
            }
            Err(e) => Err(e),
        }
    }

    fn unknown_tool_message(&self, name: &str) -> String {
        format!(
            "Error: {} is not a valid tool, try one of [{}].",
            name,
            self.tools.names().join(", ")
        )
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the conversation store
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Get the inference client
    pub fn inference(&self) -> &Arc<dyn InferenceClient> {
        &self.inference
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Reject replies that are neither a final answer nor a usable tool request
fn check_reply(message: &Message) -> Result<()> {
    if message.role != Role::Assistant {
        return Err(AgentError::Inference(format!("expected assistant reply, got {}", message.role)));
    }
    if message.tool_calls.is_empty() {
        if message.content.trim().is_empty() {
            return Err(AgentError::Inference("reply has neither content nor tool calls".into()));
        }
        return Ok(());
    }

    let mut ids = HashSet::new();
    for call in &message.tool_calls {
        if call.id.is_empty() {
            return Err(AgentError::Inference(format!("tool call '{}' has no id", call.name)));
        }
        if !ids.insert(call.id.as_str()) {
            return Err(AgentError::Inference(format!("duplicate tool call id '{}'", call.id)));
        }
    }
    Ok(())
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    inference: Option<Arc<dyn InferenceClient>>,
    tools: ToolRegistry,
    store: Option<Arc<dyn ConversationStore>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            inference: None,
            tools: ToolRegistry::new(),
            store: None,
            config: AgentConfig::default(),
        }
    }

    pub fn inference(mut self, inference: Arc<dyn InferenceClient>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Result<Self> {
        self.tools.register(tool)?;
        Ok(self)
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_tool_round_trips(mut self, max: usize) -> Self {
        self.config.max_tool_round_trips = max;
        self
    }

    pub fn inference_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.inference_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let inference = self
            .inference
            .ok_or_else(|| AgentError::Config("Inference client is required".into()))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryConversationStore::new()));

        Ok(Agent::new(inference, Arc::new(self.tools), store, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        tool_request, EchoTool, FailingTool, HangingInference, HangingTool, ScriptedInference, SlowTool,
    };

    struct Fixture {
        agent: Agent,
        inference: Arc<ScriptedInference>,
        store: Arc<MemoryConversationStore>,
        thread: ThreadId,
    }

    async fn fixture(inference: ScriptedInference, tools: ToolRegistry) -> Fixture {
        let inference = Arc::new(inference);
        let store = Arc::new(MemoryConversationStore::new());
        let thread = store.create_thread().await.unwrap();
        let agent = AgentBuilder::new()
            .inference(inference.clone())
            .store(store.clone())
            .tools(tools)
            .system_prompt("You are Botato.")
            .build()
            .unwrap();

        Fixture {
            agent,
            inference,
            store,
            thread,
        }
    }

    fn search_tools() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(EchoTool::named("web_search")).unwrap();
        tools.register(EchoTool::named("wiki_search")).unwrap();
        tools
    }

    fn roles(history: &[Message]) -> Vec<Role> {
        history.iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let f = fixture(
            ScriptedInference::new().reply(Message::assistant("Hello! How can I help?")),
            search_tools(),
        )
        .await;

        let answer = f.agent.run_turn(&f.thread, "Hi!").await.unwrap();
        assert_eq!(answer, "Hello! How can I help?");

        let history = f.store.history(&f.thread).await.unwrap();
        assert_eq!(roles(&history), vec![Role::User, Role::Assistant]);
        assert_eq!(history[0].content, "Hi!");
    }

    #[tokio::test]
    async fn test_user_message_precedes_first_model_call() {
        let f = fixture(ScriptedInference::new().reply(Message::assistant("ok")), search_tools()).await;
        f.agent.run_turn(&f.thread, "question").await.unwrap();

        let seen = f.inference.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].last().unwrap().content, "question");
        assert_eq!(f.inference.system_prompts(), vec!["You are Botato."]);
    }

    #[tokio::test]
    async fn test_single_tool_round_trip() {
        let f = fixture(
            ScriptedInference::new()
                .reply(tool_request(&[("call_1", "web_search", "rust 2024 edition")]))
                .reply(Message::assistant("It shipped with Rust 1.85.")),
            search_tools(),
        )
        .await;

        let answer = f.agent.run_turn(&f.thread, "When did the 2024 edition ship?").await.unwrap();
        assert_eq!(answer, "It shipped with Rust 1.85.");

        let history = f.store.history(&f.thread).await.unwrap();
        assert_eq!(
            roles(&history),
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[2].content, "echo: rust 2024 edition");

        let seen = f.inference.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].len(), 3);
    }

    #[tokio::test]
    async fn test_failing_tool_feeds_apology_back() {
        let mut tools = ToolRegistry::new();
        tools.register(FailingTool::named("web_search")).unwrap();
        let f = fixture(
            ScriptedInference::new()
                .reply(tool_request(&[("call_1", "web_search", "news")]))
                .reply(Message::assistant("Search is down, sorry.")),
            tools,
        )
        .await;

        let answer = f.agent.run_turn(&f.thread, "Any news?").await.unwrap();
        assert_eq!(answer, "Search is down, sorry.");

        let history = f.store.history(&f.thread).await.unwrap();
        assert_eq!(history[2].content, FailingTool::APOLOGY);
        let second_call = &f.inference.seen()[1];
        assert_eq!(second_call.last().unwrap().content, FailingTool::APOLOGY);
    }

    #[tokio::test]
    async fn test_tool_results_follow_declared_order() {
        let mut tools = ToolRegistry::new();
        tools.register(SlowTool::new("a", Duration::from_millis(40))).unwrap();
        tools.register(SlowTool::new("b", Duration::from_millis(0))).unwrap();
        tools.register(SlowTool::new("c", Duration::from_millis(15))).unwrap();
        let f = fixture(
            ScriptedInference::new()
                .reply(tool_request(&[("1", "a", "x"), ("2", "b", "y"), ("3", "c", "z")]))
                .reply(Message::assistant("done")),
            tools,
        )
        .await;

        f.agent.run_turn(&f.thread, "go").await.unwrap();

        let history = f.store.history(&f.thread).await.unwrap();
        let results: Vec<_> = history
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| (m.tool_call_id.clone().unwrap(), m.content.clone()))
            .collect();
        assert_eq!(
            results,
            vec![
                ("1".to_string(), "a: x".to_string()),
                ("2".to_string(), "b: y".to_string()),
                ("3".to_string(), "c: z".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_round_trip_limit() {
        let mut script = ScriptedInference::new();
        for i in 0..3 {
            let id = format!("call_{}", i);
            script = script.reply(tool_request(&[(id.as_str(), "web_search", "again")]));
        }
        let inference = Arc::new(script);
        let store = Arc::new(MemoryConversationStore::new());
        let thread = store.create_thread().await.unwrap();
        let agent = AgentBuilder::new()
            .inference(inference.clone())
            .store(store.clone())
            .tools(search_tools())
            .max_tool_round_trips(2)
            .build()
            .unwrap();

        let err = agent.run_turn(&thread, "loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::LoopLimitExceeded(2)));

        // The third tool request is not persisted, so every call has its result.
        let history = store.history(&thread).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history.last().unwrap().role, Role::Tool);
        assert!(unanswered_tool_calls(&history).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_answered_in_history() {
        let f = fixture(
            ScriptedInference::new()
                .reply(tool_request(&[("call_1", "stock_quote", "AAPL")]))
                .reply(Message::assistant("I can't look that up.")),
            search_tools(),
        )
        .await;

        f.agent.run_turn(&f.thread, "AAPL price?").await.unwrap();

        let history = f.store.history(&f.thread).await.unwrap();
        assert_eq!(
            history[2].content,
            "Error: stock_quote is not a valid tool, try one of [web_search, wiki_search]."
        );
    }

    #[tokio::test]
    async fn test_inference_error_surfaces_after_user_message_persisted() {
        let f = fixture(
            ScriptedInference::new().fail(AgentError::Inference("quota exceeded".into())),
            search_tools(),
        )
        .await;

        let err = f.agent.run_turn(&f.thread, "Hi!").await.unwrap_err();
        assert!(matches!(err, AgentError::Inference(_)));

        let history = f.store.history(&f.thread).await.unwrap();
        assert_eq!(roles(&history), vec![Role::User]);
    }

    #[tokio::test]
    async fn test_model_call_times_out() {
        let store = Arc::new(MemoryConversationStore::new());
        let thread = store.create_thread().await.unwrap();
        let agent = AgentBuilder::new()
            .inference(Arc::new(HangingInference))
            .store(store.clone())
            .inference_timeout(Some(Duration::from_millis(20)))
            .build()
            .unwrap();

        let err = agent.run_turn(&thread, "Hi!").await.unwrap_err();
        assert!(matches!(err, AgentError::InferenceTimeout(limit) if limit == Duration::from_millis(20)));

        let history = store.history(&thread).await.unwrap();
        assert_eq!(roles(&history), vec![Role::User]);
    }

    #[tokio::test]
    async fn test_empty_reply_is_malformed() {
        let f = fixture(ScriptedInference::new().reply(Message::assistant("  ")), search_tools()).await;

        let err = f.agent.run_turn(&f.thread, "Hi!").await.unwrap_err();
        assert!(matches!(err, AgentError::Inference(_)));
        assert_eq!(f.store.history(&f.thread).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_call_ids_are_malformed() {
        let f = fixture(
            ScriptedInference::new().reply(tool_request(&[
                ("dup", "web_search", "a"),
                ("dup", "wiki_search", "b"),
            ])),
            search_tools(),
        )
        .await;

        let err = f.agent.run_turn(&f.thread, "q").await.unwrap_err();
        assert!(matches!(err, AgentError::Inference(msg) if msg.contains("duplicate")));
    }

    #[tokio::test]
    async fn test_unknown_thread() {
        let f = fixture(ScriptedInference::new(), search_tools()).await;
        let err = f.agent.run_turn(&ThreadId::new(), "Hi!").await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownThread(_)));
        assert!(f.inference.seen().is_empty());
    }

    #[tokio::test]
    async fn test_interrupted_batch_keeps_finished_results() {
        let mut tools = ToolRegistry::new().with_timeout(None);
        tools.register(EchoTool::named("echo")).unwrap();
        tools.register(HangingTool).unwrap();
        let f = fixture(
            ScriptedInference::new().reply(tool_request(&[
                ("a", "echo", "1"),
                ("b", "echo", "2"),
                ("c", "hang", "3"),
                ("d", "echo", "4"),
            ])),
            tools,
        )
        .await;

        let handle = tokio::spawn({
            let agent = f.agent.clone();
            let thread = f.thread.clone();
            async move { agent.run_turn(&thread, "q").await }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while f.store.history(&f.thread).await.unwrap().len() < 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        handle.abort();
        let _ = handle.await;

        let history = f.store.history(&f.thread).await.unwrap();
        let answered: Vec<_> = history
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(answered, vec!["a", "b"]);
        assert_eq!(history.len(), 4);

        // A later turn on the same thread answers the leftovers first.
        let resumed = AgentBuilder::new()
            .inference(Arc::new(ScriptedInference::new().reply(Message::assistant("recovered"))))
            .store(f.store.clone())
            .tools({
                let mut tools = ToolRegistry::new();
                tools.register(EchoTool::named("echo")).unwrap();
                tools.register(HangingTool).unwrap();
                tools
            })
            .build()
            .unwrap();
        assert_eq!(resumed.run_turn(&f.thread, "still there?").await.unwrap(), "recovered");

        let history = f.store.history(&f.thread).await.unwrap();
        assert_eq!(history.len(), 8);
        assert_eq!(history[4].tool_call_id.as_deref(), Some("c"));
        assert_eq!(history[4].content, "Error occurred while running hang. Please try again.");
        assert_eq!(history[5].tool_call_id.as_deref(), Some("d"));
        assert_eq!(history[6].content, "still there?");
    }

    #[tokio::test]
    async fn test_builder_requires_inference() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
