//! History endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use study_core::session::grade;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/history?kind=&range=&tz_offset_minutes=
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryListResponse>> {
    let offset = query.local_offset().ok_or_else(|| {
        ApiError::BadRequest(format!(
            "tz_offset_minutes must be within ±{}",
            MAX_TZ_OFFSET_MINUTES
        ))
    })?;
    let since = query.range.since(Utc::now(), offset);
    let rows = state.db.list_history(auth.user_id, query.kind, since).await?;

    Ok(Json(HistoryListResponse {
        entries: rows.iter().map(DbHistory::to_entry).collect(),
    }))
}

/// GET /api/history/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(history_id): Path<Uuid>,
) -> Result<Json<HistoryEntry>> {
    let row = state
        .db
        .get_history(auth.user_id, history_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("History entry not found".to_string()))?;

    Ok(Json(row.to_entry()))
}

/// DELETE /api/history/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(history_id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.db.delete_history(auth.user_id, history_id).await? {
        return Err(ApiError::NotFound("History entry not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, %history_id, "Deleted history entry");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/history/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<HistoryStatsResponse>> {
    let mut stats = HistoryStatsResponse::default();

    for row in state.db.history_counts(auth.user_id).await? {
        match StudyKind::from_str(&row.kind) {
            Some(StudyKind::Flashcards) => stats.flashcards = row.count,
            Some(StudyKind::Quiz) => stats.quiz = row.count,
            Some(StudyKind::Summary) => stats.summary = row.count,
            None => tracing::warn!("Unknown history kind in database: {}", row.kind),
        }
    }

    stats.latest_quiz = state
        .db
        .latest_quiz(auth.user_id)
        .await?
        .and_then(|row| row.result.0.quiz_score())
        .map(|(score, total)| grade(score, total));

    Ok(Json(stats))
}
