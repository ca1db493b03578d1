use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::memory::Memory;
use crate::model::{CompletionModel, CompletionRequest, ModelError};
use crate::task::TaskContext;
use crate::tools::{Tool, ToolError, strip_code_fences};

/// How an agent treats a failing tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPolicy {
    /// The directive cannot be answered without tool data; failure is fatal.
    Required,
    /// Tool data enriches the directive; failure is logged and skipped.
    BestEffort,
}

/// What an agent does when a tool succeeds but returns zero records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnEmptyData {
    /// Carry on with whatever the model knows.
    Proceed,
    /// Treat an empty record set as a failed task.
    Fail,
}

/// A role-bound executor: behavioral instructions, a completion model, and
/// zero or more data-gathering tools. Immutable after construction.
pub struct Agent {
    role: String,
    instructions: String,
    model: Arc<dyn CompletionModel>,
    tools: Vec<Box<dyn Tool>>,
    tool_policy: ToolPolicy,
    on_empty: OnEmptyData,
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        instructions: impl Into<String>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        Self {
            role: role.into(),
            instructions: instructions.into(),
            model,
            tools: vec![],
            tool_policy: ToolPolicy::BestEffort,
            on_empty: OnEmptyData::Proceed,
        }
    }

    pub fn with_tool(mut self, tool: Box<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tool_policy(mut self, policy: ToolPolicy) -> Self {
        self.tool_policy = policy;
        self
    }

    pub fn with_on_empty(mut self, on_empty: OnEmptyData) -> Self {
        self.on_empty = on_empty;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Execute a rendered directive: gather data from the bound tools, then
    /// ask the model for the final text.
    ///
    /// Tool failures are fatal only under [`ToolPolicy::Required`]; a model
    /// failure always is.
    pub fn execute(
        &self,
        directive: &str,
        context: &TaskContext,
        memory: &mut Memory,
    ) -> Result<String, AgentError> {
        let mut prompt = directive.to_string();

        for tool in &self.tools {
            let query = query_from(context);
            match tool.invoke(&query) {
                Ok(records) if records.is_empty() => {
                    memory.log(format!("{}: {} returned no records", self.role, tool.name()));
                    if self.on_empty == OnEmptyData::Fail {
                        return Err(AgentError::EmptyToolData {
                            tool: tool.name().to_string(),
                        });
                    }
                }
                Ok(records) => {
                    memory.log(format!(
                        "{}: {} returned {} records",
                        self.role,
                        tool.name(),
                        records.len()
                    ));
                    prompt.push_str(&render_records(tool.name(), &records));
                }
                Err(source) => match self.tool_policy {
                    ToolPolicy::Required => {
                        return Err(AgentError::Tool {
                            tool: tool.name().to_string(),
                            source,
                        });
                    }
                    ToolPolicy::BestEffort => {
                        memory.log(format!(
                            "{}: {} failed ({source}), proceeding without its data",
                            self.role,
                            tool.name()
                        ));
                    }
                },
            }
        }

        let request = CompletionRequest {
            system: self.instructions.clone(),
            user: prompt,
        };
        let text = self.model.complete(&request).map_err(AgentError::Model)?;
        Ok(strip_code_fences(&text))
    }
}

/// Turn a task context into a structured tool query.
fn query_from(context: &TaskContext) -> Value {
    Value::Object(
        context
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

fn render_records(tool: &str, records: &[Value]) -> String {
    let body = serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
    format!(
        "\n\nData gathered by {tool} ({} records):\n{body}",
        records.len()
    )
}

/// Error type for agent execution.
#[derive(Debug)]
pub enum AgentError {
    /// The completion call failed.
    Model(ModelError),
    /// A required tool failed.
    Tool { tool: String, source: ToolError },
    /// A tool returned zero records and the agent is configured to fail.
    EmptyToolData { tool: String },
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(source) => write!(f, "model completion failed: {source}"),
            Self::Tool { tool, source } => write!(f, "required tool {tool} failed: {source}"),
            Self::EmptyToolData { tool } => write!(f, "{tool} returned no records"),
        }
    }
}

impl std::error::Error for AgentError {}
