//! The completion-model seam.
//!
//! The model is an opaque remote service reached over a request/response
//! API. The reasoning loop calls `complete()` without knowing which backend
//! is configured; tests substitute scripted mocks.

use async_trait::async_trait;

use crate::error::ModelError;
use crate::message::ChatMessage;

/// A remote completion model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// The model identifier sent with every request (e.g., "smollm2:135m").
    fn model_name(&self) -> &str;

    /// Send the conversation and return the model's complete reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, ModelError>;

    /// Can we reach the model service?
    async fn health_check(&self) -> bool {
        true
    }
}
