//! OpenAI-compatible completion client.
//!
//! Works with any endpoint exposing `/v1/chat/completions`: vLLM, Ollama,
//! OpenAI, OpenRouter. Non-streaming only; the reasoning loop parses
//! complete replies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use agentry_core::error::ModelError;
use agentry_core::message::ChatMessage;
use agentry_core::model::ModelBackend;

/// A completion client for one configured model endpoint.
pub struct ModelClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ModelClient {
    /// Create a client with default temperature and timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let timeout_secs = 90;
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature: 0.7,
            max_tokens: None,
            timeout_secs,
            client: build_client(timeout_secs),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.client = build_client(timeout_secs);
        self
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.timeout_secs)
        } else {
            ModelError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for ModelClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .auth(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Model API returned error");
            return Err(ModelError::Api { status_code: status, message });
        }

        let api_response: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self.auth(self.client.get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .expect("failed to build HTTP client")
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::net::SocketAddr;

    async fn spawn_server(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn completion_json(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn complete_extracts_first_choice_content() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(completion_json("Hello from the model")) }),
        );
        let addr = spawn_server(router).await;

        let client = ModelClient::new(format!("http://{addr}"), "test-model", None);
        let reply = client.complete(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "Hello from the model");
    }

    #[tokio::test]
    async fn error_status_maps_to_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (axum::http::StatusCode::SERVICE_UNAVAILABLE, "overloaded")
            }),
        );
        let addr = spawn_server(router).await;

        let client = ModelClient::new(format!("http://{addr}"), "test-model", None);
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        match err {
            ModelError::Api { status_code, message } => {
                assert_eq!(status_code, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_choices_is_invalid_response() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(serde_json::json!({"choices": []})) }),
        );
        let addr = spawn_server(router).await;

        let client = ModelClient::new(format!("http://{addr}"), "test-model", None);
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Nothing listens on this port.
        let client = ModelClient::new("http://127.0.0.1:9", "test-model", None);
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ModelError::Unavailable(_)));
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[tokio::test]
    async fn health_check_reflects_models_endpoint() {
        let router = Router::new().route(
            "/v1/models",
            get(|| async { Json(serde_json::json!({"data": []})) }),
        );
        let addr = spawn_server(router).await;

        let healthy = ModelClient::new(format!("http://{addr}"), "test-model", None);
        assert!(healthy.health_check().await);

        let unreachable = ModelClient::new("http://127.0.0.1:9", "test-model", None);
        assert!(!unreachable.health_check().await);
    }

    #[tokio::test]
    async fn bearer_header_sent_when_key_configured() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: axum::http::HeaderMap| async move {
                let auth = headers
                    .get("Authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                assert_eq!(auth, "Bearer sk-test");
                Json(completion_json("ok"))
            }),
        );
        let addr = spawn_server(router).await;

        let client =
            ModelClient::new(format!("http://{addr}"), "test-model", Some("sk-test".into()));
        let reply = client.complete(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "ok");
    }
}
