//! Common test utilities and fixtures for integration tests.
//!
//! # Requirements
//! Tests marked `requires database` need PostgreSQL (set DATABASE_URL).
//! The chat API is always replaced by a local stub.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use tokio::sync::mpsc;
use uuid::Uuid;

use crammode_backend::config::Config;
use crammode_backend::db::Database;
use crammode_backend::services::chat::ChatClient;
use crammode_backend::services::history;
use crammode_backend::services::sessions::{self, SessionRegistry};
use crammode_backend::{router, AppState};

/// Test context holding the router and, when connected, the database.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

fn test_config(database_url: &str, chat_url: &str) -> Config {
    let vars = HashMap::from([
        ("DATABASE_URL", database_url.to_string()),
        ("CHAT_API_KEY", "test-key".to_string()),
        ("CHAT_API_URL", chat_url.to_string()),
        ("QUIZ_SECONDS_PER_QUESTION", "15".to_string()),
    ]);
    Config::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}

fn build(db: Arc<Database>, config: Config) -> TestContext {
    let (finished_tx, finished_rx) = mpsc::unbounded_channel();
    history::spawn_writer(db.clone(), finished_rx);

    let registry = Arc::new(SessionRegistry::new(finished_tx, config.session_idle_ttl));
    sessions::spawn_sweeper(&registry);

    let state = AppState {
        db: db.clone(),
        chat: Arc::new(ChatClient::new(config.chat.clone())),
        sessions: registry,
        config: Arc::new(config),
    };

    TestContext {
        db,
        app: router(state),
    }
}

impl TestContext {
    /// Connect to the test database; the chat API points at `chat_url`.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new(chat_url: &str) -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        build(Arc::new(db), test_config(&database_url, chat_url))
    }

    /// Context whose database is never reached. Only routes that fail
    /// before touching the database can be exercised.
    pub fn without_database() -> Self {
        let database_url = "postgres://localhost/unused";
        let db = Database::connect_lazy(database_url).expect("lazy pool");
        build(Arc::new(db), test_config(database_url, "http://127.0.0.1:9/v2/chat"))
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self, name: Option<&str>) -> (Uuid, String) {
        let user = self
            .db
            .create_user(name)
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value")
    }

    /// Wait until the background writer has saved `expected` quiz entries.
    pub async fn wait_for_quiz_history(&self, user_id: Uuid, expected: usize) -> bool {
        for _ in 0..50 {
            let saved = self
                .db
                .list_history(user_id, Some(study_core::StudyKind::Quiz), None)
                .await
                .map(|rows| rows.len())
                .unwrap_or(0);
            if saved >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    /// Remove a user and, by cascade, its history.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }
}
