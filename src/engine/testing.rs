//! Mock collaborators for engine tests
//!
//! These mocks enable exercising the round loop without real I/O.

use crate::llm::{
    ContentBlock, LlmClient, LlmError, LlmRequest, LlmResponse, StopReason, ToolDefinition, Usage,
};
use crate::tools::{ToolError, ToolExecutor};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A direct text reply
pub fn text_reply(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        usage: Usage::default(),
    }
}

/// A tool-use reply requesting the given calls, in order
pub fn tool_reply(calls: &[(&str, &str, Value)]) -> LlmResponse {
    LlmResponse {
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone()))
            .collect(),
        stop_reason: StopReason::ToolUse,
        usage: Usage::default(),
    }
}

/// A reply with arbitrary content blocks and stop reason
pub fn reply_with(content: Vec<ContentBlock>, stop_reason: StopReason) -> LlmResponse {
    LlmResponse {
        content,
        stop_reason,
        usage: Usage::default(),
    }
}

/// Mock LLM client that returns queued replies and records every request
pub struct MockLlm {
    replies: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, reply: LlmResponse) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// Mock tool executor with per-tool scripted outcomes and recorded calls
pub struct MockTools {
    outcomes: HashMap<String, Result<String, String>>,
    pub executions: Mutex<Vec<(String, Value)>>,
}

impl MockTools {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Register a tool that succeeds with the given output
    pub fn with_tool(mut self, name: impl Into<String>, output: impl Into<String>) -> Self {
        self.outcomes.insert(name.into(), Ok(output.into()));
        self
    }

    /// Register a tool that fails with the given message
    pub fn with_failing_tool(mut self, name: impl Into<String>, error: impl Into<String>) -> Self {
        self.outcomes.insert(name.into(), Err(error.into()));
        self
    }

    pub fn recorded_executions(&self) -> Vec<(String, Value)> {
        self.executions.lock().unwrap().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.lock().unwrap().len()
    }
}

impl Default for MockTools {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for MockTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut names: Vec<&String> = self.outcomes.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| ToolDefinition {
                name: name.clone(),
                description: format!("Mock {name}"),
                input_schema: serde_json::json!({ "type": "object", "properties": {} }),
            })
            .collect()
    }

    async fn execute(&self, name: &str, input: Value) -> Result<String, ToolError> {
        self.executions
            .lock()
            .unwrap()
            .push((name.to_string(), input));
        match self.outcomes.get(name) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(ToolError::Failed(message.clone())),
            None => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
