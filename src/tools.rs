//! Tool implementations for lectern
//!
//! Tools are stateless apart from source attribution; each declares a JSON
//! schema and validates its arguments against it by deserialization before
//! touching the catalog.

pub mod outline;
pub mod search;

pub use outline::CourseOutlineTool;
pub use search::SearchContentTool;

use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Tool invocation failure, surfaced to the backend as result text
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("{0}")]
    Failed(String),
}

/// Source attribution for a piece of returned content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Trait for tools the backend can request
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, as offered to the backend
    fn name(&self) -> &str;

    /// Tool description for the backend
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool, returning text for the backend
    async fn run(&self, input: Value) -> Result<String, ToolError>;

    /// Sources recorded by the most recent execution
    fn last_sources(&self) -> Vec<Source> {
        Vec::new()
    }

    /// Clear recorded sources
    fn reset_sources(&self) {}
}

/// Executor contract the orchestration engine depends on: the tool catalog
/// plus by-name dispatch. Failures come back as descriptive errors, never
/// panics.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Get tool definitions for the backend
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Execute a tool by name
    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError>;
}

/// Collection of registered tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Sources recorded by the last tool that produced any
    pub fn last_sources(&self) -> Vec<Source> {
        self.tools
            .iter()
            .map(|t| t.last_sources())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Clear source attributions on all tools
    pub fn reset_sources(&self) {
        for tool in &self.tools {
            tool.reset_sources();
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError> {
        for tool in &self.tools {
            if tool.name() == name {
                return tool.run(input).await;
            }
        }
        Err(ToolError::UnknownTool(name.to_string()))
    }
}
