//! The delegation router: resolves peer names and invokes peers over HTTP.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use agentry_core::error::DelegationError;
use agentry_core::peer::{AgentCard, PeerRouter, PeerSummary};

/// One configured peer agent, with a lazily-discovered card.
pub struct PeerAgent {
    name: String,
    base_url: String,
    /// Description from configuration, used until (and unless) the peer's
    /// card is discovered.
    configured_description: String,
    card: RwLock<Option<AgentCard>>,
}

impl PeerAgent {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            configured_description: description.into(),
            card: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Routes delegated sub-tasks to configured peers.
pub struct DelegationRouter {
    peers: Vec<PeerAgent>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl DelegationRouter {
    pub fn new(peers: Vec<PeerAgent>, timeout_secs: u64) -> Self {
        Self {
            peers,
            timeout_secs,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    fn find(&self, peer_name: &str) -> Result<&PeerAgent, DelegationError> {
        self.peers
            .iter()
            .find(|p| p.name == peer_name)
            .ok_or_else(|| DelegationError::UnknownPeer(peer_name.to_string()))
    }

    /// Fetch and cache a peer's discovery card. Failures are soft: the
    /// configured description keeps working without a card.
    pub async fn discover(&self, peer_name: &str) -> Option<AgentCard> {
        let peer = self.find(peer_name).ok()?;
        if let Some(card) = peer.card.read().await.as_ref() {
            return Some(card.clone());
        }

        let url = format!("{}/.well-known/agent", peer.base_url);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<AgentCard>().await {
                    Ok(card) => {
                        debug!(peer = %peer.name, "Discovered peer card");
                        *peer.card.write().await = Some(card.clone());
                        Some(card)
                    }
                    Err(e) => {
                        warn!(peer = %peer.name, error = %e, "Invalid peer card");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(peer = %peer.name, status = response.status().as_u16(), "Peer card fetch failed");
                None
            }
            Err(e) => {
                warn!(peer = %peer.name, error = %e, "Peer card fetch failed");
                None
            }
        }
    }
}

/// The wire shape of a peer's invocation reply. Current runtimes answer with
/// `result`; older ones used `response`.
#[derive(Debug, Deserialize)]
struct InvokeReply {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

#[async_trait]
impl PeerRouter for DelegationRouter {
    async fn peer_summaries(&self) -> Vec<PeerSummary> {
        let mut summaries = Vec::with_capacity(self.peers.len());
        for peer in &self.peers {
            let description = match peer.card.read().await.as_ref() {
                Some(card) if !card.description.is_empty() => card.description.clone(),
                _ => peer.configured_description.clone(),
            };
            summaries.push(PeerSummary {
                name: peer.name.clone(),
                description,
            });
        }
        summaries
    }

    async fn delegate(
        &self,
        peer_name: &str,
        task: &str,
        context: Option<&str>,
    ) -> Result<String, DelegationError> {
        let peer = self.find(peer_name)?;
        let url = format!("{}/agent/invoke", peer.base_url);

        let mut payload = serde_json::json!({ "task": task });
        if let Some(context) = context {
            payload["context"] = serde_json::json!(context);
        }

        debug!(peer = %peer.name, task_len = task.len(), "Delegating task");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DelegationError::Timeout {
                        peer: peer.name.clone(),
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    DelegationError::Unreachable {
                        peer: peer.name.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(DelegationError::Unreachable {
                peer: peer.name.clone(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let reply: InvokeReply = response.json().await.map_err(|e| {
            DelegationError::Unreachable {
                peer: peer.name.clone(),
                reason: format!("invalid reply: {e}"),
            }
        })?;

        // Any text answer is a success.
        Ok(reply.result.or(reply.response).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::net::SocketAddr;

    async fn spawn_peer(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn single_peer_router(addr: SocketAddr) -> DelegationRouter {
        DelegationRouter::new(
            vec![PeerAgent::new("worker-1", format!("http://{addr}"), "A worker")],
            30,
        )
    }

    #[tokio::test]
    async fn delegate_returns_result_field() {
        let addr = spawn_peer(Router::new().route(
            "/agent/invoke",
            post(|Json(payload): Json<serde_json::Value>| async move {
                assert_eq!(payload["task"], "add 2 and 3");
                Json(serde_json::json!({"result": "5"}))
            }),
        ))
        .await;

        let router = single_peer_router(addr);
        let answer = router.delegate("worker-1", "add 2 and 3", None).await.unwrap();
        assert_eq!(answer, "5");
    }

    #[tokio::test]
    async fn delegate_accepts_legacy_response_field() {
        let addr = spawn_peer(Router::new().route(
            "/agent/invoke",
            post(|| async { Json(serde_json::json!({"response": "done", "status": "completed"})) }),
        ))
        .await;

        let router = single_peer_router(addr);
        let answer = router.delegate("worker-1", "work", None).await.unwrap();
        assert_eq!(answer, "done");
    }

    #[tokio::test]
    async fn delegate_forwards_context() {
        let addr = spawn_peer(Router::new().route(
            "/agent/invoke",
            post(|Json(payload): Json<serde_json::Value>| async move {
                assert_eq!(payload["context"], "User: earlier question");
                Json(serde_json::json!({"result": "ok"}))
            }),
        ))
        .await;

        let router = single_peer_router(addr);
        router
            .delegate("worker-1", "work", Some("User: earlier question"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_peer_is_its_own_error() {
        let router = DelegationRouter::new(vec![], 30);
        let err = router.delegate("ghost", "work", None).await.unwrap_err();
        assert!(matches!(err, DelegationError::UnknownPeer(_)));
        assert_eq!(err.kind(), "peer_not_found");
    }

    #[tokio::test]
    async fn unreachable_peer_maps_to_unreachable() {
        let router = DelegationRouter::new(
            vec![PeerAgent::new("worker-1", "http://127.0.0.1:9", "")],
            30,
        );
        let err = router.delegate("worker-1", "work", None).await.unwrap_err();
        assert!(matches!(err, DelegationError::Unreachable { .. }));
        assert_eq!(err.kind(), "peer_unreachable");
    }

    #[tokio::test]
    async fn error_status_maps_to_unreachable() {
        let addr = spawn_peer(Router::new().route(
            "/agent/invoke",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;

        let router = single_peer_router(addr);
        let err = router.delegate("worker-1", "work", None).await.unwrap_err();
        match err {
            DelegationError::Unreachable { ref reason, .. } => {
                assert!(reason.contains("500"));
            }
            ref other => panic!("expected Unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn discovery_upgrades_peer_description() {
        let addr = spawn_peer(Router::new().route(
            "/.well-known/agent",
            get(|| async {
                Json(serde_json::json!({
                    "name": "worker-1",
                    "description": "Discovered math specialist",
                    "url": "http://worker-1:8080"
                }))
            }),
        ))
        .await;

        let router = single_peer_router(addr);

        // Before discovery: configured description.
        assert_eq!(router.peer_summaries().await[0].description, "A worker");

        let card = router.discover("worker-1").await.unwrap();
        assert_eq!(card.description, "Discovered math specialist");

        // After discovery: the card wins.
        assert_eq!(
            router.peer_summaries().await[0].description,
            "Discovered math specialist"
        );
    }

    #[tokio::test]
    async fn discovery_failure_is_soft() {
        let router = DelegationRouter::new(
            vec![PeerAgent::new("worker-1", "http://127.0.0.1:9", "Fallback text")],
            30,
        );
        assert!(router.discover("worker-1").await.is_none());
        assert_eq!(router.peer_summaries().await[0].description, "Fallback text");
    }
}
