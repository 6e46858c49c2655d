//! Client for the hosted chat completion API.
//!
//! One request per generation. Failures are returned to the caller as-is;
//! nothing is retried.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use study_core::Prompt;

pub const DEFAULT_CHAT_API_URL: &str = "https://api.cohere.com/v2/chat";
pub const DEFAULT_CHAT_MODEL: &str = "command-a-03-2025";

/// Chat client errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub message: ChatReply,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ChatResponse {
    /// Text blocks of the reply, each trimmed, joined by newlines.
    pub fn text(&self) -> String {
        self.message
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.trim())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Endpoint, credentials and model for the chat API.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the request body for a prompt.
    pub fn request(&self, prompt: &Prompt) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: vec![ContentBlock::text(&prompt.system)],
                },
                ChatMessage {
                    role: Role::User,
                    content: vec![ContentBlock::text(&prompt.user)],
                },
            ],
        }
    }

    /// Send a prompt and return the reply text.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String, ChatError> {
        let request = self.request(prompt);

        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Chat request failed: {}", e);
                ChatError::Network(e.to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Chat API returned an error");
            return Err(ChatError::Backend { status, message });
        }

        let response: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        tracing::debug!(id = %response.id, blocks = response.message.content.len(), "Chat reply received");

        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn spawn_stub(status: StatusCode, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();

        let app = Router::new().route(
            "/v2/chat",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                let reply = reply.clone();
                async move {
                    let auth = headers
                        .get(AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, body));
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v2/chat", addr), seen)
    }

    fn client(api_url: String) -> ChatClient {
        ChatClient::new(ChatConfig {
            api_url,
            api_key: "secret".to_string(),
            model: "test-model".to_string(),
        })
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "be brief".to_string(),
            user: "summarize this".to_string(),
        }
    }

    #[test]
    fn request_carries_system_and_user_messages() {
        let request = client("http://unused".to_string()).request(&prompt());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "be brief");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"][0]["text"], "summarize this");
    }

    #[test]
    fn reply_text_joins_trimmed_text_blocks() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "r1",
            "message": {
                "role": "assistant",
                "content": [
                    { "type": "text", "text": "  Q: one\nA: uno  " },
                    { "type": "thinking", "text": "ignored" },
                    { "type": "text", "text": "Q: two\nA: dos\n" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(response.text(), "Q: one\nA: uno\nQ: two\nA: dos");
    }

    #[tokio::test]
    async fn complete_posts_with_bearer_auth() {
        let reply = json!({
            "id": "abc",
            "message": { "role": "assistant", "content": [{ "type": "text", "text": "Hello" }] }
        });
        let (url, seen) = spawn_stub(StatusCode::OK, reply).await;

        let text = client(url).complete(&prompt()).await.unwrap();
        assert_eq!(text, "Hello");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret"));
        assert_eq!(seen[0].1["model"], "test-model");
    }

    #[tokio::test]
    async fn non_success_status_is_backend_error() {
        let (url, _) = spawn_stub(StatusCode::TOO_MANY_REQUESTS, json!({ "message": "quota" })).await;

        let err = client(url).complete(&prompt()).await.unwrap_err();
        match err {
            ChatError::Backend { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("quota"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let (url, _) = spawn_stub(StatusCode::OK, json!({ "unexpected": true })).await;

        let err = client(url).complete(&prompt()).await.unwrap_err();
        assert!(matches!(err, ChatError::Parse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}/v2/chat", addr))
            .complete(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
    }
}
