//! The Agentry reasoning loop.
//!
//! One `ReasoningLoop` value per process, one `run()` per task invocation.
//! Each run resolves a session, appends the inbound task to memory, and then
//! alternates between model inference and action dispatch (tool call or
//! delegation) until the model produces a final answer or the step budget
//! runs out. Callers always get a response; remote failures below the loop
//! become error events the model can react to, never caller-visible crashes.

pub mod action;
pub mod context;
pub mod loop_runner;

pub use action::{parse_action, ModelAction};
pub use loop_runner::ReasoningLoop;
