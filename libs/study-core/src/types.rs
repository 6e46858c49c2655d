//! Core types for the study aid.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A question/answer pair parsed from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A multiple-choice question.
///
/// `user_answer` stays `None` until a quiz session records a submission
/// (or a timeout, which also records `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub user_answer: Option<String>,
}

impl QuizQuestion {
    /// A question is usable when its correct answer is one of its options.
    pub fn is_valid(&self) -> bool {
        !self.question.is_empty() && self.options.iter().any(|o| *o == self.correct_answer)
    }

    pub fn is_correct(&self) -> bool {
        self.user_answer.as_deref() == Some(self.correct_answer.as_str())
    }
}

/// Output language requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Filipino,
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Filipino => "Filipino",
        }
    }
}

/// Requested summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self::Medium
    }
}

/// Requested summary layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFormat {
    Paragraph,
    Bullet,
}

impl Default for SummaryFormat {
    fn default() -> Self {
        Self::Paragraph
    }
}

/// Kind of study material stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyKind {
    Flashcards,
    Quiz,
    Summary,
}

impl StudyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::Summary => "summary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "flashcards" => Some(Self::Flashcards),
            "quiz" => Some(Self::Quiz),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }
}

/// Kind-specific payload of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StudyResult {
    Flashcards { cards: Vec<Flashcard> },
    Quiz { questions: Vec<QuizQuestion> },
    Summary { text: String },
}

impl StudyResult {
    pub fn kind(&self) -> StudyKind {
        match self {
            Self::Flashcards { .. } => StudyKind::Flashcards,
            Self::Quiz { .. } => StudyKind::Quiz,
            Self::Summary { .. } => StudyKind::Summary,
        }
    }

    /// Correct answers over total, for quiz results only.
    pub fn quiz_score(&self) -> Option<(usize, usize)> {
        match self {
            Self::Quiz { questions } => Some((
                questions.iter().filter(|q| q.is_correct()).count(),
                questions.len(),
            )),
            _ => None,
        }
    }
}

/// Date window used when filtering history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRange {
    All,
    Today,
    Week,
    Month,
}

impl Default for HistoryRange {
    fn default() -> Self {
        Self::All
    }
}

impl HistoryRange {
    /// Earliest timestamp inside the window, or `None` for no bound.
    ///
    /// Day, week and month boundaries fall on the caller's local calendar,
    /// given as a fixed offset from UTC. Weeks start on Monday.
    pub fn since(&self, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let today = now.with_timezone(&offset).date_naive();
        let start = match self {
            Self::All => return None,
            Self::Today => today,
            Self::Week => today - Duration::days(today.weekday().num_days_from_monday() as i64),
            Self::Month => today.with_day(1)?,
        };
        let midnight = start.and_hms_opt(0, 0, 0)?.and_local_timezone(offset).single()?;
        Some(midnight.with_timezone(&Utc))
    }
}
