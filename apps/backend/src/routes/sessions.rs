//! Interactive quiz and flashcard session endpoints

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use study_core::{FlashcardSession, QuizConfig, QuizSession};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

fn quiz_response(session_id: Uuid, view: QuizView) -> Json<QuizSessionResponse> {
    Json(QuizSessionResponse { session_id, view })
}

fn flashcard_response(session_id: Uuid, view: FlashcardView) -> Json<FlashcardSessionResponse> {
    Json(FlashcardSessionResponse { session_id, view })
}

async fn history_result(state: &AppState, auth: &AuthenticatedUser, history_id: Uuid) -> Result<DbHistory> {
    state
        .db
        .get_history(auth.user_id, history_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("History entry not found".to_string()))
}

// === Quiz ===

/// POST /api/sessions/quiz
/// Starts a timed quiz over the given questions, or a read-only review of a saved one
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<StartQuizRequest>,
) -> Result<Json<QuizSessionResponse>> {
    let (input_text, questions, config) = match payload {
        StartQuizRequest::Review { history_id } => {
            let row = history_result(&state, &auth, history_id).await?;
            let StudyResult::Quiz { questions } = row.result.0 else {
                return Err(ApiError::BadRequest("History entry is not a quiz".to_string()));
            };
            (row.input_text, questions, QuizConfig::review())
        }
        StartQuizRequest::Fresh {
            questions,
            input_text,
            time_per_question_secs,
        } => {
            if let Some(index) = questions.iter().position(|q| !q.is_valid()) {
                return Err(ApiError::BadRequest(format!(
                    "question {} has a correct answer that is not one of its options",
                    index
                )));
            }
            let time_per_question = match time_per_question_secs {
                Some(0) => {
                    return Err(ApiError::BadRequest(
                        "time_per_question_secs must be positive".to_string(),
                    ))
                }
                Some(secs) => Duration::from_secs(secs),
                None => state.config.quiz_time_per_question,
            };
            let config = QuizConfig {
                time_per_question,
                read_only: false,
                auto_advance_after: state.config.quiz_auto_advance,
            };
            (input_text, questions, config)
        }
    };

    if questions.is_empty() {
        return Err(ApiError::BadRequest("quiz has no questions".to_string()));
    }

    let session = QuizSession::new(questions, config)?;
    let (session_id, view) = state
        .sessions
        .start_quiz(auth.user_id, input_text, session)
        .await?;

    Ok(quiz_response(session_id, view))
}

/// GET /api/sessions/quiz/:id
pub async fn quiz_view(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<QuizSessionResponse>> {
    let view = state.sessions.quiz_view(auth.user_id, session_id).await?;
    Ok(quiz_response(session_id, view))
}

/// POST /api/sessions/quiz/:id/select
pub async fn select(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<QuizSessionResponse>> {
    let view = state
        .sessions
        .select(auth.user_id, session_id, &payload.option)
        .await?;
    Ok(quiz_response(session_id, view))
}

/// POST /api/sessions/quiz/:id/submit
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<QuizSessionResponse>> {
    let view = state.sessions.submit(auth.user_id, session_id).await?;
    Ok(quiz_response(session_id, view))
}

/// POST /api/sessions/quiz/:id/advance
pub async fn advance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<QuizSessionResponse>> {
    let view = state.sessions.advance(auth.user_id, session_id).await?;
    Ok(quiz_response(session_id, view))
}

/// POST /api/sessions/quiz/:id/retry
pub async fn retry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<QuizSessionResponse>> {
    let view = state.sessions.retry(auth.user_id, session_id).await?;
    Ok(quiz_response(session_id, view))
}

/// DELETE /api/sessions/quiz/:id
pub async fn end_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.sessions.end_quiz(auth.user_id, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// === Flashcards ===

/// POST /api/sessions/flashcards
pub async fn start_flashcards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<StartFlashcardsRequest>,
) -> Result<Json<FlashcardSessionResponse>> {
    let cards = match payload {
        StartFlashcardsRequest::Review { history_id } => {
            let row = history_result(&state, &auth, history_id).await?;
            let StudyResult::Flashcards { cards } = row.result.0 else {
                return Err(ApiError::BadRequest(
                    "History entry is not a flashcard set".to_string(),
                ));
            };
            cards
        }
        StartFlashcardsRequest::Fresh { cards } => cards,
    };

    if cards.is_empty() {
        return Err(ApiError::BadRequest("flashcard set is empty".to_string()));
    }

    let (session_id, view) = state
        .sessions
        .start_flashcards(auth.user_id, FlashcardSession::new(cards)?)?;

    Ok(flashcard_response(session_id, view))
}

/// GET /api/sessions/flashcards/:id
pub async fn flashcard_view(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FlashcardSessionResponse>> {
    let view = state.sessions.flashcard_view(auth.user_id, session_id)?;
    Ok(flashcard_response(session_id, view))
}

/// POST /api/sessions/flashcards/:id/next
pub async fn next_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FlashcardSessionResponse>> {
    let view = state.sessions.next_card(auth.user_id, session_id)?;
    Ok(flashcard_response(session_id, view))
}

/// POST /api/sessions/flashcards/:id/prev
pub async fn prev_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FlashcardSessionResponse>> {
    let view = state.sessions.prev_card(auth.user_id, session_id)?;
    Ok(flashcard_response(session_id, view))
}

/// POST /api/sessions/flashcards/:id/flip
pub async fn flip_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FlashcardSessionResponse>> {
    let view = state.sessions.flip_card(auth.user_id, session_id)?;
    Ok(flashcard_response(session_id, view))
}

/// DELETE /api/sessions/flashcards/:id
pub async fn end_flashcards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.sessions.end_flashcards(auth.user_id, session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
