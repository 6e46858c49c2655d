//! Generation endpoints: notes in, study material out

use axum::{extract::State, Extension, Json};
use study_core::prompt::{self, MAX_ITEMS};
use study_core::{parse_flashcards, parse_quiz};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

fn input_text(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("input_text must not be blank".to_string()));
    }
    Ok(trimmed)
}

fn item_count(count: u32) -> Result<u32> {
    if !prompt::is_valid_count(count) {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {}",
            MAX_ITEMS
        )));
    }
    Ok(count)
}

/// POST /api/generate/flashcards
pub async fn flashcards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<FlashcardsResponse>> {
    let input = input_text(&payload.input_text)?;
    let count = item_count(payload.count)?;

    let reply = state
        .chat
        .complete(&prompt::flashcards(input, count, payload.language))
        .await?;

    let cards = parse_flashcards(&reply);
    if cards.is_empty() {
        tracing::warn!(user_id = %auth.user_id, "Model reply contained no flashcards");
        return Err(ApiError::NoRecords(
            "No flashcards could be read from the reply".to_string(),
        ));
    }
    tracing::info!(user_id = %auth.user_id, requested = count, parsed = cards.len(), "Generated flashcards");

    let entry = state
        .db
        .insert_history(&NewHistory::new(
            auth.user_id,
            input,
            StudyResult::Flashcards {
                cards: cards.clone(),
            },
        ))
        .await?;

    Ok(Json(FlashcardsResponse {
        history_id: entry.id,
        cards,
    }))
}

/// POST /api/generate/quiz
/// Questions are saved to history once a quiz over them is finished
pub async fn quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<QuizResponse>> {
    let input = input_text(&payload.input_text)?;
    let count = item_count(payload.count)?;

    let reply = state
        .chat
        .complete(&prompt::quiz(input, count, payload.language))
        .await?;

    let questions = parse_quiz(&reply);
    if questions.is_empty() {
        tracing::warn!(user_id = %auth.user_id, "Model reply contained no quiz questions");
        return Err(ApiError::NoRecords(
            "No quiz questions could be read from the reply".to_string(),
        ));
    }
    tracing::info!(user_id = %auth.user_id, requested = count, parsed = questions.len(), "Generated quiz");

    Ok(Json(QuizResponse { questions }))
}

/// POST /api/generate/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>> {
    let input = input_text(&payload.input_text)?;

    let reply = state
        .chat
        .complete(&prompt::summary(
            input,
            payload.language,
            payload.length,
            payload.format,
        ))
        .await?;

    let text = prompt::clean_summary(&reply);
    if text.is_empty() {
        return Err(ApiError::NoRecords("Summary reply was empty".to_string()));
    }
    tracing::info!(user_id = %auth.user_id, chars = text.len(), "Generated summary");

    let entry = state
        .db
        .insert_history(&NewHistory::new(
            auth.user_id,
            input,
            StudyResult::Summary { text: text.clone() },
        ))
        .await?;

    Ok(Json(SummaryResponse {
        history_id: entry.id,
        text,
    }))
}
