pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::chat::ChatClient;
use crate::services::history;
use crate::services::sessions::{self, SessionRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub chat: Arc<ChatClient>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<Config>,
}

/// Build the full router: public routes plus everything behind bearer auth.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // User routes
        .route("/api/user/status", get(routes::user::status))
        .route("/api/user/rotate-token", post(routes::user::rotate_token))
        // Generation routes
        .route("/api/generate/flashcards", post(routes::generate::flashcards))
        .route("/api/generate/quiz", post(routes::generate::quiz))
        .route("/api/generate/summary", post(routes::generate::summary))
        // History routes
        .route("/api/history", get(routes::history::list))
        .route("/api/history/stats", get(routes::history::stats))
        .route(
            "/api/history/:id",
            get(routes::history::get).delete(routes::history::delete),
        )
        // Quiz session routes
        .route("/api/sessions/quiz", post(routes::sessions::start_quiz))
        .route(
            "/api/sessions/quiz/:id",
            get(routes::sessions::quiz_view).delete(routes::sessions::end_quiz),
        )
        .route("/api/sessions/quiz/:id/select", post(routes::sessions::select))
        .route("/api/sessions/quiz/:id/submit", post(routes::sessions::submit))
        .route("/api/sessions/quiz/:id/advance", post(routes::sessions::advance))
        .route("/api/sessions/quiz/:id/retry", post(routes::sessions::retry))
        // Flashcard session routes
        .route("/api/sessions/flashcards", post(routes::sessions::start_flashcards))
        .route(
            "/api/sessions/flashcards/:id",
            get(routes::sessions::flashcard_view).delete(routes::sessions::end_flashcards),
        )
        .route("/api/sessions/flashcards/:id/next", post(routes::sessions::next_card))
        .route("/api/sessions/flashcards/:id/prev", post(routes::sessions::prev_card))
        .route("/api/sessions/flashcards/:id/flip", post(routes::sessions::flip_card))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/user/register", post(routes::user::register))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Arc::new(Database::connect(&config.database_url).await?);

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let (finished_tx, finished_rx) = mpsc::unbounded_channel();
    history::spawn_writer(db.clone(), finished_rx);

    tracing::info!(model = %config.chat.model, "Using chat API at {}", config.chat.api_url);

    let registry = Arc::new(SessionRegistry::new(finished_tx, config.session_idle_ttl));
    sessions::spawn_sweeper(&registry);
    tracing::info!(idle_secs = config.session_idle_ttl.as_secs(), "Evicting idle sessions");

    let addr = config.bind_addr();
    let state = AppState {
        db,
        chat: Arc::new(ChatClient::new(config.chat.clone())),
        sessions: registry,
        config: Arc::new(config),
    };

    let app = router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
