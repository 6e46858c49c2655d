//! Core study library shared by the backend and any client.
//!
//! Provides:
//! - Parsers turning model replies into flashcards and quiz questions
//! - Quiz and flashcard session state machines
//! - Prompt builders for flashcards, quizzes and summaries
//! - Shared types (Flashcard, QuizQuestion, StudyResult, etc.)

pub mod error;
pub mod parser;
pub mod prompt;
pub mod session;
pub mod types;

pub use error::{Result, SessionError};
pub use parser::{parse_flashcards, parse_quiz};
pub use prompt::Prompt;
pub use session::{FlashcardSession, QuizConfig, QuizSession, QuizSnapshot};
pub use types::{
    Flashcard, HistoryRange, Language, QuizQuestion, StudyKind, StudyResult, SummaryFormat,
    SummaryLength,
};
