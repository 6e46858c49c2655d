//! Interactive study sessions.

pub mod flashcard;
pub mod quiz;

pub use flashcard::{FlashcardSession, FlashcardView};
pub use quiz::{
    grade, Advance, CountdownTicket, Grade, QuizConfig, QuizPhase, QuizSession, QuizSnapshot,
    QuizView, Submission, Tick, Verdict, DEFAULT_TIME_PER_QUESTION,
};
