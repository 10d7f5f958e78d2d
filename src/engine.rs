//! Bounded multi-round answer orchestration
//!
//! Drives a conversation with the generative backend: each round the backend
//! either answers directly or requests tool invocations, whose results are
//! fed back for the next round. The loop runs under a hard round budget;
//! exhausting it triggers one forced tool-free call so the caller always
//! gets an answer string, never an error.

#[cfg(test)]
pub mod testing;

use crate::llm::{ContentBlock, LlmClient, LlmMessage, LlmRequest, LlmResponse, StopReason};
use crate::system_prompt::build_system_context;
use crate::tools::ToolExecutor;
use std::sync::Arc;

/// Tool rounds permitted before the forced final call
pub const DEFAULT_MAX_ROUNDS: u32 = 2;
const DEFAULT_MAX_TOKENS: u32 = 800;
const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Returned when a direct answer carries no extractable text
const UNEXTRACTABLE_REPLY: &str = "Unable to extract response text.";
/// Returned when a mid-conversation backend failure leaves nothing to recover
const GATHERING_APOLOGY: &str =
    "I encountered an error while gathering additional information, but cannot provide a complete response.";
/// Returned when the forced final call yields no text
const INCOMPLETE_ANSWER: &str =
    "Based on the search results found, I was unable to provide a complete response. Please try rephrasing your question.";

/// Why the round loop stopped continuing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The backend answered without requesting tools
    DirectAnswer,
    /// At least one tool invocation in a round failed
    ToolFailure,
    /// The round budget ran out before a direct answer
    BudgetExhausted,
    /// A backend call failed after the first round
    BackendFailure,
}

/// Round-by-round progress of one query. Owned by the engine for the
/// duration of a single `answer` call.
#[derive(Debug, Default)]
pub struct RoundState {
    round: u32,
    messages: Vec<LlmMessage>,
    tool_execution_count: u32,
    last_reply: Option<LlmResponse>,
    termination: Option<Termination>,
}

impl RoundState {
    fn new(query: &str) -> Self {
        Self {
            round: 1,
            messages: vec![LlmMessage::user_text(query)],
            tool_execution_count: 0,
            last_reply: None,
            termination: None,
        }
    }

    /// The single continuation predicate, checked before every backend call
    /// in the bounded loop.
    fn can_continue(&self, max_rounds: u32) -> bool {
        self.termination.is_none() && self.round <= max_rounds
    }

    /// Record a termination cause. The first recorded reason wins; later
    /// causes never overwrite it.
    fn terminate(&mut self, reason: Termination) {
        if self.termination.is_none() {
            self.termination = Some(reason);
        }
    }

    fn push_message(&mut self, message: LlmMessage) {
        self.messages.push(message);
    }

    /// Best-effort text from the last successfully received reply
    fn recovered_text(&self) -> Option<String> {
        self.last_reply
            .as_ref()
            .map(LlmResponse::text)
            .filter(|t| !t.is_empty())
    }

    #[allow(dead_code)] // Used in tests
    pub fn round(&self) -> u32 {
        self.round
    }

    #[allow(dead_code)] // Used in tests
    pub fn tool_execution_count(&self) -> u32 {
        self.tool_execution_count
    }

    #[allow(dead_code)] // Used in tests
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }
}

/// The round-loop engine. Stateless between queries; every `answer` call
/// owns a fresh [`RoundState`].
pub struct AnswerEngine {
    llm: Arc<dyn LlmClient>,
    max_rounds: u32,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerEngine {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Answer a query, optionally with prior-conversation context and tools.
    ///
    /// Always returns an answer string: backend and tool failures are
    /// downgraded to human-readable text, never propagated.
    pub async fn answer(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&dyn ToolExecutor>,
    ) -> String {
        let system = build_system_context(history);
        let mut state = RoundState::new(query);

        while state.can_continue(self.max_rounds) {
            let request = self.build_request(&system, &state, tools);

            let reply = match self.llm.complete(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    if state.round == 1 {
                        // Fail fast: nothing useful has happened yet.
                        tracing::warn!(error = %e, "backend call failed on first round");
                        return format!("I encountered an error processing your query: {e}");
                    }
                    tracing::warn!(
                        error = %e,
                        round = state.round,
                        "backend call failed mid-conversation, attempting recovery"
                    );
                    state.terminate(Termination::BackendFailure);
                    return state
                        .recovered_text()
                        .unwrap_or_else(|| GATHERING_APOLOGY.to_string());
                }
            };

            state.last_reply = Some(reply.clone());

            match (reply.stop_reason, tools) {
                (StopReason::ToolUse, Some(executor)) => {
                    self.run_tool_round(&mut state, executor, &reply).await;
                }
                _ => {
                    state.terminate(Termination::DirectAnswer);
                    let text = reply.text();
                    return if text.is_empty() {
                        UNEXTRACTABLE_REPLY.to_string()
                    } else {
                        text
                    };
                }
            }
        }

        // The loop stopped without a direct answer; the budget tag applies
        // unless an earlier round already recorded a cause.
        state.terminate(Termination::BudgetExhausted);
        tracing::debug!(
            rounds = state.round,
            tools_executed = state.tool_execution_count,
            termination = ?state.termination,
            "round loop finished without direct answer"
        );
        self.force_final_answer(&system, &state).await
    }

    /// Execute every tool requested in `reply`, strictly in the order
    /// received. A failing tool gets a synthesized failure result and marks
    /// the state, but never aborts the remaining calls in the round.
    async fn run_tool_round(
        &self,
        state: &mut RoundState,
        executor: &dyn ToolExecutor,
        reply: &LlmResponse,
    ) {
        state.push_message(LlmMessage::assistant(reply.content.clone()));

        let mut results = Vec::new();
        for (id, name, input) in reply.tool_uses() {
            match executor.execute(name, input.clone()).await {
                Ok(output) => {
                    results.push(ContentBlock::tool_result(id, output, false));
                }
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "tool execution failed");
                    results.push(ContentBlock::tool_result(
                        id,
                        format!("Tool execution failed: {e}"),
                        true,
                    ));
                    state.terminate(Termination::ToolFailure);
                }
            }
            state.tool_execution_count += 1;
        }

        // One aggregated result message per round. An empty tool list is a
        // no-op round: the assistant message stands alone.
        if !results.is_empty() {
            state.push_message(LlmMessage::tool_results(results));
        }
        state.round += 1;
    }

    /// The forced tool-free final call issued when the loop stops without a
    /// direct answer. Withholding the catalog forces a text-only reply.
    async fn force_final_answer(&self, system: &str, state: &RoundState) -> String {
        let request = LlmRequest {
            system: system.to_string(),
            messages: state.messages.clone(),
            tools: Vec::new(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match self.llm.complete(&request).await {
            Ok(reply) => {
                let text = reply.text();
                if text.is_empty() {
                    INCOMPLETE_ANSWER.to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "forced final call failed");
                state.recovered_text().unwrap_or_else(|| {
                    format!("I encountered an error generating the final response: {e}")
                })
            }
        }
    }

    fn build_request(
        &self,
        system: &str,
        state: &RoundState,
        tools: Option<&dyn ToolExecutor>,
    ) -> LlmRequest {
        LlmRequest {
            system: system.to_string(),
            messages: state.messages.clone(),
            tools: tools.map(|t| t.definitions()).unwrap_or_default(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
