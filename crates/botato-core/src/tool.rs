//! Tool System
//!
//! Tools are named unary capabilities over text, registered once at startup and
//! invoked by name from the agent loop. A failing tool never aborts a turn: the
//! registry converts the failure into the tool's fallback text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Default per-invocation deadline
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, unique within the requesting assistant message
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one invocation, already rendered as text for the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (tool text or fallback message)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: output.into(),
        }
    }
}

/// The single text parameter a tool accepts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// Human-readable description
    pub description: String,
}

/// Tool definition advertised to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Input parameter
    pub input: ParameterSchema,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_name: impl Into<String>,
        input_description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input: ParameterSchema {
                name: input_name.into(),
                description: input_description.into(),
            },
        }
    }

    /// JSON Schema object for function-calling APIs
    pub fn parameters_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.input.name.clone(),
            json!({ "type": "string", "description": self.input.description }),
        );

        json!({
            "type": "object",
            "properties": properties,
            "required": [self.input.name],
        })
    }

    /// Extract the text input from call arguments
    pub fn extract_input<'a>(&self, arguments: &'a HashMap<String, Value>) -> Result<&'a str> {
        match arguments.get(&self.input.name) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(AgentError::ToolValidation(format!(
                "parameter '{}' must be a string, got {}",
                self.input.name, other
            ))),
            None => Err(AgentError::ToolValidation(format!(
                "missing required parameter '{}'",
                self.input.name
            ))),
        }
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Run the tool on its text input
    async fn execute(&self, input: &str) -> Result<String>;

    /// Text handed to the model when execution fails or times out
    fn failure_message(&self) -> String {
        format!(
            "Error occurred while running {}. Please try again.",
            self.schema().name
        )
    }
}

struct RegisteredTool {
    schema: ToolSchema,
    tool: Arc<dyn Tool>,
}

/// Registry for available tools, kept in registration order
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    timeout: Option<Duration>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            timeout: Some(DEFAULT_TOOL_TIMEOUT),
        }
    }

    /// Set the per-invocation deadline (`None` disables it)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let schema = tool.schema();
        if self.index.contains_key(&schema.name) {
            return Err(AgentError::DuplicateTool(schema.name));
        }
        self.index.insert(schema.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { schema, tool });
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].tool.clone())
    }

    /// Schemas in registration order
    pub fn describe(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema.clone()).collect()
    }

    /// Get tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.schema.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name.
    ///
    /// Only an unknown name is an error. Invalid arguments, failures and timeouts
    /// come back as an unsuccessful [`ToolResult`] whose output is meant for the model.
    pub async fn invoke(&self, name: &str, arguments: &HashMap<String, Value>) -> Result<ToolResult> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;

        let input = match entry.schema.extract_input(arguments) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Rejected tool arguments");
                return Ok(ToolResult::failure(
                    name,
                    format!("Invalid arguments for tool '{}': {}", name, e),
                ));
            }
        };

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, entry.tool.execute(input)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AgentError::ToolExecution(format!("timed out after {:?}", limit))),
            },
            None => entry.tool.execute(input).await,
        };

        match outcome {
            Ok(output) => Ok(ToolResult::success(name, output)),
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "Tool execution failed");
                Ok(ToolResult::failure(name, entry.tool.failure_message()))
            }
        }
    }
}
