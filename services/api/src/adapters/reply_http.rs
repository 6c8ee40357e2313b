//! services/api/src/adapters/reply_http.rs
//!
//! Forwards the conversation to an external reply endpoint. The endpoint owns
//! whatever produces the answer; this adapter only moves JSON.

use async_trait::async_trait;
use chat_widget_core::{AssistantReply, Language, Message, PortError, PortResult, ReplyService};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

#[derive(Serialize)]
struct ReplyRequest<'a> {
    language: Language,
    messages: &'a [Message],
}

/// A `ReplyService` backed by an HTTP endpoint.
#[derive(Clone)]
pub struct HttpReplyAdapter {
    client: Client,
    endpoint: String,
}

impl HttpReplyAdapter {
    /// Creates a new `HttpReplyAdapter` posting to `endpoint`.
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReplyService for HttpReplyAdapter {
    async fn request_reply(
        &self,
        transcript: &[Message],
        language: Language,
    ) -> PortResult<AssistantReply> {
        debug!(
            "Requesting reply for {} messages from {}",
            transcript.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ReplyRequest {
                language,
                messages: transcript,
            })
            .send()
            .await
            .map_err(|e| {
                error!("Reply upstream request failed: {:?}", e);
                PortError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Unexpected(format!(
                "reply upstream returned {}",
                status
            )));
        }

        response
            .json::<AssistantReply>()
            .await
            .map_err(|e| PortError::Unexpected(format!("invalid reply payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use chat_widget_core::{MessageStore, Role};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    /// Serves the given router on an ephemeral port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn transcript() -> Vec<Message> {
        let mut store = MessageStore::new();
        store.append(Role::User, "Do you build apps?", None, Utc::now());
        store.as_slice().to_vec()
    }

    #[tokio::test]
    async fn posts_transcript_and_parses_reply() {
        let router = Router::new().route(
            "/reply",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "content": format!(
                        "{} / {}",
                        body["language"].as_str().unwrap_or_default(),
                        body["messages"][0]["content"].as_str().unwrap_or_default()
                    ),
                    "parts": [{"type": "text", "text": "yes"}]
                }))
            }),
        );
        let base = serve(router).await;
        let adapter = HttpReplyAdapter::new(Client::new(), format!("{}/reply", base));

        let reply = adapter.request_reply(&transcript(), Language::Fr).await.unwrap();
        assert_eq!(reply.content, "fr / Do you build apps?");
        assert_eq!(reply.parts.map(|p| p.len()), Some(1));
    }

    #[tokio::test]
    async fn non_success_status_is_unexpected() {
        let router = Router::new().route(
            "/reply",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;
        let adapter = HttpReplyAdapter::new(Client::new(), format!("{}/reply", base));

        let err = adapter.request_reply(&transcript(), Language::En).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn malformed_payload_is_unexpected() {
        let router = Router::new().route("/reply", post(|| async { "not a reply" }));
        let base = serve(router).await;
        let adapter = HttpReplyAdapter::new(Client::new(), format!("{}/reply", base));

        let err = adapter.request_reply(&transcript(), Language::En).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(msg) if msg.contains("invalid reply payload")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let adapter = HttpReplyAdapter::new(Client::new(), format!("http://{}/reply", addr));

        let err = adapter.request_reply(&transcript(), Language::En).await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
    }
}
