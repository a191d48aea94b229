//! The bounded reasoning loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use agentry_core::error::{Error, ToolError};
use agentry_core::event::{EventType, MemoryEvent};
use agentry_core::model::ModelBackend;
use agentry_core::peer::PeerRouter;
use agentry_core::store::SessionStore;
use agentry_core::task::{LoopState, TaskOutcome, TerminalReason};
use agentry_core::tool::ToolSource;

use crate::action::{parse_action, ModelAction};
use crate::context::build_messages;

/// Fallback response when the budget runs out before the model produced any
/// output at all (only possible when the very first inference fails to
/// happen, which the fatal-error path already covers; kept for totality).
const NO_OUTPUT_NOTICE: &str =
    "I was unable to complete the task within the allotted reasoning steps.";

/// The reasoning loop. One instance per process; `run()` once per task.
pub struct ReasoningLoop {
    model: Arc<dyn ModelBackend>,
    store: Arc<dyn SessionStore>,
    tools: Vec<Arc<dyn ToolSource>>,
    peers: Arc<dyn PeerRouter>,
    instructions: String,
    app_name: String,
    max_steps: u32,
    context_window: usize,
}

impl ReasoningLoop {
    pub fn new(
        model: Arc<dyn ModelBackend>,
        store: Arc<dyn SessionStore>,
        tools: Vec<Arc<dyn ToolSource>>,
        peers: Arc<dyn PeerRouter>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            model,
            store,
            tools,
            peers,
            instructions: instructions.into(),
            app_name: "agent".into(),
            max_steps: 8,
            context_window: 20,
        }
    }

    /// Set the step budget (model inferences per invocation).
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Set the conversation-context window (events per BuildContext).
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    /// Set the app name recorded on created sessions.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Answer one task.
    ///
    /// Terminates with a final answer, a best-effort partial answer (budget
    /// exhausted, or model lost mid-run), or an error when the model fails
    /// before producing anything. Never panics; tool and delegation failures
    /// are recorded and fed back to the model.
    pub async fn run(&self, task: &str, session_id: Option<String>) -> Result<TaskOutcome, Error> {
        let session_id = self
            .store
            .get_or_create_session(session_id, &self.app_name, "user")
            .await;

        info!(session_id = %session_id, task_len = task.len(), "Task invocation started");

        self.store
            .add_event(&session_id, MemoryEvent::new(EventType::UserMessage, task))
            .await;

        let mut state = LoopState::new(self.max_steps);
        let mut action_log: Vec<String> = Vec::new();

        while state.has_budget() {
            let conversation = self
                .store
                .build_conversation_context(&session_id, self.context_window)
                .await;
            let tools = self.collect_tools().await;
            let peers = self.peers.peer_summaries().await;
            let messages = build_messages(
                &self.instructions,
                &tools,
                &peers,
                &conversation,
                &action_log,
                task,
            );

            state.advance();
            debug!(session_id = %session_id, step = state.step, "Inference step");

            let reply = match self.model.complete(&messages).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Model call failed");
                    self.store
                        .add_event(
                            &session_id,
                            MemoryEvent::new(EventType::Error, e.to_string())
                                .with_metadata("error_kind", e.kind()),
                        )
                        .await;

                    // A partial answer beats an error; fail the invocation
                    // only when there is nothing at all to return.
                    return match state.last_model_output.take() {
                        Some(partial) => {
                            Ok(self
                                .finish(
                                    &session_id,
                                    partial,
                                    TerminalReason::FatalError,
                                    &state,
                                )
                                .await)
                        }
                        None => Err(Error::Model(e)),
                    };
                }
            };

            state.last_model_output = Some(reply.clone());

            match parse_action(&reply) {
                ModelAction::Final(text) => {
                    info!(session_id = %session_id, steps = state.step, "Final answer");
                    return Ok(self
                        .finish(&session_id, text, TerminalReason::FinalAnswer, &state)
                        .await);
                }

                ModelAction::ToolCall { name, arguments } => {
                    self.store
                        .add_event(
                            &session_id,
                            MemoryEvent::new(
                                EventType::ToolCall,
                                serde_json::json!({"tool": name, "arguments": arguments}),
                            ),
                        )
                        .await;

                    match self.dispatch_tool(&name, arguments).await {
                        Ok(result) => {
                            debug!(session_id = %session_id, tool = %name, "Tool call succeeded");
                            action_log.push(format!("Tool '{name}' returned: {result}"));
                            self.store
                                .add_event(
                                    &session_id,
                                    MemoryEvent::new(
                                        EventType::ToolResult,
                                        serde_json::json!({"tool": name, "result": result}),
                                    ),
                                )
                                .await;
                        }
                        Err(e) => {
                            warn!(session_id = %session_id, tool = %name, error = %e, "Tool call failed");
                            action_log.push(format!("Tool '{name}' failed: {e}"));
                            self.store
                                .add_event(
                                    &session_id,
                                    MemoryEvent::new(EventType::Error, e.to_string())
                                        .with_metadata("error_kind", e.kind())
                                        .with_metadata("tool", name.as_str()),
                                )
                                .await;
                        }
                    }
                }

                ModelAction::Delegate { peer, task: subtask } => {
                    self.store
                        .add_event(
                            &session_id,
                            MemoryEvent::new(
                                EventType::DelegationRequest,
                                serde_json::json!({"agent": peer, "task": subtask}),
                            ),
                        )
                        .await;

                    // Peers get a trimmed view of the conversation, not the
                    // whole ledger.
                    let context = self
                        .store
                        .build_conversation_context(&session_id, self.context_window)
                        .await;
                    let context = (!context.is_empty()).then_some(context.as_str());

                    match self.peers.delegate(&peer, &subtask, context).await {
                        Ok(answer) => {
                            debug!(session_id = %session_id, peer = %peer, "Delegation succeeded");
                            action_log.push(format!("Peer '{peer}' answered: {answer}"));
                            self.store
                                .add_event(
                                    &session_id,
                                    MemoryEvent::new(
                                        EventType::DelegationResponse,
                                        serde_json::json!({"agent": peer, "result": answer}),
                                    ),
                                )
                                .await;
                        }
                        Err(e) => {
                            warn!(session_id = %session_id, peer = %peer, error = %e, "Delegation failed");
                            action_log.push(format!("Delegation to '{peer}' failed: {e}"));
                            self.store
                                .add_event(
                                    &session_id,
                                    MemoryEvent::new(EventType::Error, e.to_string())
                                        .with_metadata("error_kind", e.kind())
                                        .with_metadata("peer", peer.as_str()),
                                )
                                .await;
                        }
                    }
                }
            }
        }

        // Step budget exhausted: the last model output is the best available
        // partial answer. Callers always get a response.
        info!(session_id = %session_id, steps = state.step, "Step budget exhausted");
        let partial = state
            .last_model_output
            .take()
            .unwrap_or_else(|| NO_OUTPUT_NOTICE.to_string());
        Ok(self
            .finish(&session_id, partial, TerminalReason::MaxStepsExceeded, &state)
            .await)
    }

    /// Record the terminal response and build the outcome.
    async fn finish(
        &self,
        session_id: &str,
        response: String,
        terminal_reason: TerminalReason,
        state: &LoopState,
    ) -> TaskOutcome {
        let mut event = MemoryEvent::new(EventType::AgentResponse, response.as_str());
        if terminal_reason != TerminalReason::FinalAnswer {
            event = event.with_metadata("terminal_reason", terminal_reason.as_str());
        }
        self.store.add_event(session_id, event).await;

        TaskOutcome {
            response,
            session_id: session_id.to_string(),
            terminal_reason,
            steps: state.step,
        }
    }

    /// All currently-known tool descriptors across sources.
    async fn collect_tools(&self) -> Vec<agentry_core::tool::ToolDescriptor> {
        let mut tools = Vec::new();
        for source in &self.tools {
            tools.extend(source.list_tools().await);
        }
        tools
    }

    /// Dispatch a tool call to the first source advertising the name.
    async fn dispatch_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        for source in &self.tools {
            let advertised = source.list_tools().await;
            if advertised.iter().any(|t| t.name == name) {
                return source.call_tool(name, arguments).await;
            }
        }
        Err(ToolError::NotFound(name.to_string()))
    }
}
