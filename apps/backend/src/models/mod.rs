//! Database models and API types

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub use study_core::session::{FlashcardView, Grade, QuizView};
pub use study_core::types::{
    Flashcard, HistoryRange, Language, QuizQuestion, StudyKind, StudyResult, SummaryFormat,
    SummaryLength,
};

use crate::services::history::hash_content;

// === Database Entity Types ===

/// Registered user, identified by bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// History entry stored in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub input_text: String,
    pub input_hash: String,
    pub result: Json<StudyResult>,
    pub score: Option<i32>,
    pub total: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl DbHistory {
    /// Convert to API entry type
    pub fn to_entry(&self) -> HistoryEntry {
        HistoryEntry {
            id: self.id,
            input_text: self.input_text.clone(),
            score: self.score,
            total: self.total,
            created_at: self.created_at,
            result: self.result.0.clone(),
        }
    }
}

/// Row to insert into study_history.
#[derive(Debug, Clone)]
pub struct NewHistory {
    pub user_id: Uuid,
    pub input_text: String,
    pub input_hash: String,
    pub result: StudyResult,
}

impl NewHistory {
    pub fn new(user_id: Uuid, input_text: impl Into<String>, result: StudyResult) -> Self {
        let input_text = input_text.into();
        Self {
            user_id,
            input_hash: hash_content(&input_text),
            input_text,
            result,
        }
    }

    pub fn kind(&self) -> StudyKind {
        self.result.kind()
    }

    pub fn score(&self) -> Option<(i32, i32)> {
        self.result
            .quiz_score()
            .map(|(score, total)| (score as i32, total as i32))
    }
}

/// Per-kind history count.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryCount {
    pub kind: String,
    pub count: i64,
}

// === API Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserStatusResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RotateTokenResponse {
    pub token: String,
}

fn default_count() -> u32 {
    5
}

/// Flashcard or quiz generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub input_text: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub input_text: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub length: SummaryLength,
    #[serde(default)]
    pub format: SummaryFormat,
}

#[derive(Debug, Serialize)]
pub struct FlashcardsResponse {
    pub history_id: Uuid,
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub history_id: Uuid,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub kind: Option<StudyKind>,
    #[serde(default)]
    pub range: HistoryRange,
    /// Client's offset from UTC in minutes east, e.g. 480 for UTC+8.
    pub tz_offset_minutes: Option<i32>,
}

/// Largest offset in use anywhere (UTC+14, UTC-12 rounded out).
pub const MAX_TZ_OFFSET_MINUTES: i32 = 14 * 60;

impl HistoryQuery {
    /// The client's calendar offset; UTC when none was sent, `None` when out of range.
    pub fn local_offset(&self) -> Option<FixedOffset> {
        match self.tz_offset_minutes {
            None => FixedOffset::east_opt(0),
            Some(minutes) if minutes.abs() <= MAX_TZ_OFFSET_MINUTES => {
                FixedOffset::east_opt(minutes * 60)
            }
            Some(_) => None,
        }
    }
}

/// History entry as returned by the API. The payload's `kind` tag sits at the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub input_text: String,
    pub score: Option<i32>,
    pub total: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: StudyResult,
}

#[derive(Debug, Serialize)]
pub struct HistoryListResponse {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Serialize)]
pub struct HistoryStatsResponse {
    pub flashcards: i64,
    pub quiz: i64,
    pub summary: i64,
    pub latest_quiz: Option<Grade>,
}

/// Start a quiz from fresh questions, or review a finished one from history.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StartQuizRequest {
    Review {
        history_id: Uuid,
    },
    Fresh {
        questions: Vec<QuizQuestion>,
        #[serde(default)]
        input_text: String,
        time_per_question_secs: Option<u64>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StartFlashcardsRequest {
    Review { history_id: Uuid },
    Fresh { cards: Vec<Flashcard> },
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub option: String,
}

#[derive(Debug, Serialize)]
pub struct QuizSessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub view: QuizView,
}

#[derive(Debug, Serialize)]
pub struct FlashcardSessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub view: FlashcardView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn generate_request_defaults() {
        let request: GenerateRequest = serde_json::from_value(json!({ "input_text": "notes" })).unwrap();
        assert_eq!(request.count, 5);
        assert_eq!(request.language, Language::English);
    }

    #[test]
    fn start_quiz_request_variants() {
        let review: StartQuizRequest =
            serde_json::from_value(json!({ "history_id": Uuid::nil() })).unwrap();
        assert!(matches!(review, StartQuizRequest::Review { .. }));

        let fresh: StartQuizRequest = serde_json::from_value(json!({
            "questions": [{ "question": "q", "options": ["a", "b"], "correct_answer": "a" }]
        }))
        .unwrap();
        match fresh {
            StartQuizRequest::Fresh {
                questions,
                input_text,
                time_per_question_secs,
            } => {
                assert_eq!(questions.len(), 1);
                assert_eq!(input_text, "");
                assert_eq!(time_per_question_secs, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn new_history_derives_kind_score_and_hash() {
        let result = StudyResult::Quiz {
            questions: vec![QuizQuestion {
                question: "q".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                correct_answer: "a".to_string(),
                user_answer: Some("a".to_string()),
            }],
        };
        let new = NewHistory::new(Uuid::nil(), "notes", result);

        assert_eq!(new.kind(), StudyKind::Quiz);
        assert_eq!(new.score(), Some((1, 1)));
        assert_eq!(new.input_hash, hash_content("notes"));
    }

    #[test]
    fn history_entry_flattens_result_kind() {
        let entry = HistoryEntry {
            id: Uuid::nil(),
            input_text: "notes".to_string(),
            score: None,
            total: None,
            created_at: Utc::now(),
            result: StudyResult::Summary {
                text: "short".to_string(),
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "summary");
        assert_eq!(json["text"], "short");
    }

    #[test]
    fn history_query_offset() {
        let query: HistoryQuery =
            serde_json::from_value(json!({ "range": "today", "tz_offset_minutes": 480 })).unwrap();
        assert_eq!(query.range, HistoryRange::Today);
        assert_eq!(query.local_offset(), FixedOffset::east_opt(8 * 3600));

        assert_eq!(HistoryQuery::default().local_offset(), FixedOffset::east_opt(0));

        let west = HistoryQuery {
            tz_offset_minutes: Some(-300),
            ..HistoryQuery::default()
        };
        assert_eq!(west.local_offset(), FixedOffset::west_opt(5 * 3600));

        let bogus = HistoryQuery {
            tz_offset_minutes: Some(24 * 60),
            ..HistoryQuery::default()
        };
        assert_eq!(bogus.local_offset(), None);
    }
}
