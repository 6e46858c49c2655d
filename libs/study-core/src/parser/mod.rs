//! Parsers turning free-text model replies into structured records.
//!
//! Both parsers are total: malformed blocks are dropped, never reported.
//! Callers detect degenerate output by the number of records returned.

pub mod flashcard;
pub mod quiz;

pub use flashcard::parse_flashcards;
pub use quiz::parse_quiz;
