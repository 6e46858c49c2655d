//! Error types for study-core.

use thiserror::Error;

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Transitions a session refused to apply.
///
/// A rejected transition leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session has no items")]
    Empty,

    #[error("session is read-only")]
    ReadOnly,

    #[error("quiz is finished")]
    Finished,

    #[error("quiz is still in progress")]
    NotFinished,

    #[error("question {index} is already answered")]
    AlreadyAnswered { index: usize },

    #[error("question {index} has not been answered yet")]
    NotAnswered { index: usize },

    #[error("no option selected")]
    NoSelection,

    #[error("unknown option: {0}")]
    UnknownOption(String),
}
