//! Completion-model client implementations for Agentry.
//!
//! The only wire shape in production is the OpenAI-compatible
//! chat-completions API, which is what vLLM, Ollama, and most hosted
//! endpoints expose; the `ModelBackend` trait keeps the loop decoupled from
//! it anyway.

pub mod openai_compat;

pub use openai_compat::ModelClient;

use std::sync::Arc;

use agentry_config::RuntimeConfig;
use agentry_core::ModelBackend;

/// Build the model client from configuration.
pub fn model_from_config(config: &RuntimeConfig) -> Arc<dyn ModelBackend> {
    Arc::new(
        ModelClient::new(
            &config.model_api_url,
            &config.model_name,
            config.model_api_key.clone(),
        )
        .with_temperature(config.model_temperature)
        .with_max_tokens(config.model_max_tokens)
        .with_timeout_secs(config.model_timeout_secs),
    )
}
