//! Study history persistence.
//!
//! Finished quizzes arrive as snapshots over a channel and are written by a
//! single background task, so a session never waits on the database.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use study_core::{QuizSnapshot, StudyResult};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::Database;
use crate::models::NewHistory;

/// A quiz attempt ready to be saved.
#[derive(Debug, Clone)]
pub struct FinishedQuiz {
    pub user_id: Uuid,
    pub input_text: String,
    pub snapshot: QuizSnapshot,
}

impl FinishedQuiz {
    pub fn into_history(self) -> NewHistory {
        NewHistory::new(
            self.user_id,
            self.input_text,
            StudyResult::Quiz {
                questions: self.snapshot.questions,
            },
        )
    }
}

/// Compute SHA256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write every finished quiz received on `rx` until all senders are dropped.
pub fn spawn_writer(db: Arc<Database>, mut rx: UnboundedReceiver<FinishedQuiz>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(finished) = rx.recv().await {
            let user_id = finished.user_id;
            let attempt = finished.snapshot.attempt;
            let (score, total) = (finished.snapshot.score, finished.snapshot.total);

            match db.insert_history(&finished.into_history()).await {
                Ok(entry) => tracing::info!(
                    %user_id,
                    history_id = %entry.id,
                    attempt,
                    score,
                    total,
                    "Saved quiz result"
                ),
                Err(e) => tracing::error!(%user_id, attempt, "Failed to save quiz result: {}", e),
            }
        }
        tracing::debug!("History writer stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::{QuizQuestion, StudyKind};

    fn answered(correct: &str, user: Option<&str>) -> QuizQuestion {
        QuizQuestion {
            question: "Pick one".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answer: correct.to_string(),
            user_answer: user.map(str::to_string),
        }
    }

    #[test]
    fn test_hash_content() {
        let hash = hash_content("test content");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_content("test content"));
        assert_ne!(hash, hash_content("other content"));
    }

    #[test]
    fn test_finished_quiz_keeps_recorded_answers() {
        let finished = FinishedQuiz {
            user_id: Uuid::nil(),
            input_text: "cell biology".to_string(),
            snapshot: QuizSnapshot {
                attempt: 1,
                questions: vec![answered("a", Some("a")), answered("b", None)],
                score: 1,
                total: 2,
            },
        };

        let history = finished.into_history();
        assert_eq!(history.kind(), StudyKind::Quiz);
        assert_eq!(history.score(), Some((1, 2)));
        assert_eq!(history.input_hash, hash_content("cell biology"));
        match history.result {
            StudyResult::Quiz { questions } => {
                assert_eq!(questions[0].user_answer.as_deref(), Some("a"));
                assert_eq!(questions[1].user_answer, None);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
