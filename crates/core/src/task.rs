//! Per-invocation loop state and task outcomes.

use serde::{Deserialize, Serialize};

/// Why a reasoning-loop execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The model produced a final answer
    FinalAnswer,
    /// The step budget ran out; the response is the best partial answer
    MaxStepsExceeded,
    /// The model became unavailable mid-run; the response is the last
    /// output that existed before the failure
    FatalError,
}

impl TerminalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalReason::FinalAnswer => "final_answer",
            TerminalReason::MaxStepsExceeded => "max_steps_exceeded",
            TerminalReason::FatalError => "fatal_error",
        }
    }
}

/// Transient state of one reasoning-loop execution.
///
/// Exists only for the duration of one task invocation; nothing here is
/// persisted beyond the events the loop appends.
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Completed inference steps; monotonically increasing
    pub step: u32,

    /// The step budget
    pub max_steps: u32,

    /// The most recent raw model output, kept as the best-effort partial
    /// answer for budget or model-failure termination
    pub last_model_output: Option<String>,
}

impl LoopState {
    pub fn new(max_steps: u32) -> Self {
        Self { step: 0, max_steps, last_model_output: None }
    }

    /// Whether another inference step is allowed.
    pub fn has_budget(&self) -> bool {
        self.step < self.max_steps
    }

    /// Consume one inference step.
    pub fn advance(&mut self) {
        debug_assert!(self.step < self.max_steps);
        self.step += 1;
    }
}

/// What a task invocation returns to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// The answer text (final, partial, or a stock notice)
    pub response: String,

    /// The session the invocation ran in
    pub session_id: String,

    /// How the loop ended
    pub terminal_reason: TerminalReason,

    /// Inference steps consumed
    pub steps: u32,
}
