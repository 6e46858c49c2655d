//! Test fixtures and factory functions for creating test data.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

/// Start a chat API stub that answers every request with `status` and `text`.
///
/// Returns the endpoint URL.
pub async fn spawn_chat_stub(status: StatusCode, text: &str) -> String {
    let body = json!({
        "id": "stub-reply",
        "message": {
            "role": "assistant",
            "content": [{ "type": "text", "text": text }]
        }
    });

    let app = Router::new().route(
        "/v2/chat",
        post(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind chat stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("chat stub");
    });

    format!("http://{}/v2/chat", addr)
}

/// Flashcard reply with `n` cards.
pub fn flashcard_reply(n: usize) -> String {
    (1..=n)
        .map(|i| format!("Q: Question {i}?\nA: Answer {i}."))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Quiz reply whose correct answer is always option A.
pub fn quiz_reply(n: usize) -> String {
    (1..=n)
        .map(|i| {
            format!(
                "Question: Question {i}?\nA. Right {i}\nB. Wrong {i}\nC. Other {i}\nD. None {i}\nAnswer: A"
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Quiz questions as accepted by the session endpoint.
pub fn quiz_questions(n: usize) -> Value {
    Value::Array(
        (1..=n)
            .map(|i| {
                json!({
                    "question": format!("Question {i}?"),
                    "options": [format!("Right {i}"), format!("Wrong {i}")],
                    "correct_answer": format!("Right {i}"),
                })
            })
            .collect(),
    )
}

pub fn generate_request(input_text: &str, count: u32) -> Value {
    json!({ "input_text": input_text, "count": count })
}

pub fn register_request(name: Option<&str>) -> Value {
    match name {
        Some(name) => json!({ "name": name }),
        None => json!({}),
    }
}
