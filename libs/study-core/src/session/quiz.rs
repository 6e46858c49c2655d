//! Quiz session state machine.
//!
//! A session owns a shuffled copy of its questions. Answers are recorded on
//! that copy only; persistence receives an immutable [`QuizSnapshot`] when
//! the last question is advanced past.
//!
//! The countdown is driven from outside, either one second at a time through
//! [`QuizSession::tick`] or by a timer that holds a [`CountdownTicket`] and
//! calls [`QuizSession::expire`]. A ticket only matches the question and
//! attempt it was issued for, so an expiry that races a submit is a no-op.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::types::QuizQuestion;

/// Default time allowed per question.
pub const DEFAULT_TIME_PER_QUESTION: Duration = Duration::from_secs(15);

const TICK: Duration = Duration::from_secs(1);

/// Session options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    pub time_per_question: Duration,
    /// Review mode: no countdown, recorded answers are shown, no input accepted.
    pub read_only: bool,
    /// Move on by itself this long after a timeout. `None` waits for the caller.
    pub auto_advance_after: Option<Duration>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            time_per_question: DEFAULT_TIME_PER_QUESTION,
            read_only: false,
            auto_advance_after: None,
        }
    }
}

impl QuizConfig {
    pub fn review() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    InProgress,
    Finished,
}

/// Identifies the countdown of one question within one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountdownTicket {
    pub attempt: u32,
    pub index: usize,
}

/// Outcome of a one-second countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown is running.
    Idle,
    Running { remaining: Duration },
    /// Time ran out and the question was recorded as unanswered.
    Expired,
}

/// A recorded answer for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub index: usize,
    /// `None` when the countdown expired.
    pub answer: Option<String>,
    pub correct: bool,
}

/// Result of moving past an answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    /// Carries the snapshot to persist; review sessions produce none.
    Finished { snapshot: Option<QuizSnapshot> },
}

/// Immutable copy of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub attempt: u32,
    pub questions: Vec<QuizQuestion>,
    pub score: usize,
    pub total: usize,
}

/// Result banner shown on the score screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Outstanding,
    GreatJob,
    KeepPracticing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub score: usize,
    pub total: usize,
    pub percent: u32,
    pub verdict: Verdict,
}

/// Grade a score: perfect is outstanding, 70% and up is a great job.
pub fn grade(score: usize, total: usize) -> Grade {
    if total == 0 {
        return Grade {
            score,
            total,
            percent: 0,
            verdict: Verdict::KeepPracticing,
        };
    }

    let verdict = if score == total {
        Verdict::Outstanding
    } else if score * 10 >= total * 7 {
        Verdict::GreatJob
    } else {
        Verdict::KeepPracticing
    };

    Grade {
        score,
        total,
        percent: (score * 100 / total) as u32,
        verdict,
    }
}

/// Question as shown to the client. The correct answer is withheld until answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// Serialisable state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizView {
    pub phase: QuizPhase,
    pub attempt: u32,
    pub index: usize,
    pub total: usize,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub selected_answer: Option<String>,
    pub is_answered: bool,
    pub time_remaining_secs: u64,
    pub score: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
}

pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    selected_answer: Option<String>,
    is_answered: bool,
    time_remaining: Duration,
    attempt: u32,
    phase: QuizPhase,
    config: QuizConfig,
    rng: StdRng,
}

impl QuizSession {
    /// Start a session over a shuffled copy of `questions`.
    pub fn new(questions: Vec<QuizQuestion>, config: QuizConfig) -> Result<Self> {
        Self::with_rng(questions, config, StdRng::from_entropy())
    }

    /// Start a session with a deterministic shuffle.
    pub fn with_seed(questions: Vec<QuizQuestion>, config: QuizConfig, seed: u64) -> Result<Self> {
        Self::with_rng(questions, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut questions: Vec<QuizQuestion>, config: QuizConfig, mut rng: StdRng) -> Result<Self> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        if !config.read_only {
            for question in &mut questions {
                question.user_answer = None;
            }
        }
        questions.shuffle(&mut rng);

        let mut session = Self {
            questions,
            current_index: 0,
            selected_answer: None,
            is_answered: false,
            time_remaining: config.time_per_question,
            attempt: 0,
            phase: QuizPhase::InProgress,
            config,
            rng,
        };
        session.reset_question();
        Ok(session)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.questions[self.current_index]
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn config(&self) -> QuizConfig {
        self.config
    }

    /// True while the question behind `ticket` has been answered or timed out
    /// and is still waiting to be advanced past.
    pub fn awaits_advance(&self, ticket: CountdownTicket) -> bool {
        !self.is_read_only()
            && self.phase == QuizPhase::InProgress
            && self.is_answered
            && self.attempt == ticket.attempt
            && self.current_index == ticket.index
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Questions whose recorded answer matches the correct one.
    pub fn score(&self) -> usize {
        self.questions.iter().filter(|q| q.is_correct()).count()
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            attempt: self.attempt,
            questions: self.questions.clone(),
            score: self.score(),
            total: self.total(),
        }
    }

    /// Ticket for the running countdown, if one is running.
    pub fn ticket(&self) -> Option<CountdownTicket> {
        let running =
            !self.is_read_only() && self.phase == QuizPhase::InProgress && !self.is_answered;
        running.then_some(CountdownTicket {
            attempt: self.attempt,
            index: self.current_index,
        })
    }

    pub fn select(&mut self, option: &str) -> Result<()> {
        self.ensure_accepts_input()?;

        if !self.current_question().options.iter().any(|o| o == option) {
            return Err(SessionError::UnknownOption(option.to_string()));
        }

        self.selected_answer = Some(option.to_string());
        Ok(())
    }

    pub fn submit(&mut self) -> Result<Submission> {
        self.ensure_accepts_input()?;

        let answer = self.selected_answer.clone().ok_or(SessionError::NoSelection)?;
        Ok(self.record(Some(answer)))
    }

    /// Apply a countdown expiry. Stale tickets are ignored.
    pub fn expire(&mut self, ticket: CountdownTicket) -> Option<Submission> {
        if self.ticket() != Some(ticket) {
            return None;
        }
        self.time_remaining = Duration::ZERO;
        Some(self.record(None))
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        let Some(ticket) = self.ticket() else {
            return Tick::Idle;
        };

        self.time_remaining = self.time_remaining.saturating_sub(TICK);
        if !self.time_remaining.is_zero() {
            return Tick::Running {
                remaining: self.time_remaining,
            };
        }

        self.expire(ticket);
        Tick::Expired
    }

    pub fn advance(&mut self) -> Result<Advance> {
        self.ensure_in_progress()?;
        if !self.is_answered {
            return Err(SessionError::NotAnswered {
                index: self.current_index,
            });
        }

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.reset_question();
            return Ok(Advance::Next {
                index: self.current_index,
            });
        }

        self.phase = QuizPhase::Finished;
        let snapshot = (!self.is_read_only()).then(|| self.snapshot());
        Ok(Advance::Finished { snapshot })
    }

    /// Start a new attempt over a reshuffled sequence.
    pub fn retry(&mut self) -> Result<()> {
        if self.is_read_only() {
            return Err(SessionError::ReadOnly);
        }
        if self.phase != QuizPhase::Finished {
            return Err(SessionError::NotFinished);
        }

        for question in &mut self.questions {
            question.user_answer = None;
        }
        self.questions.shuffle(&mut self.rng);
        self.attempt += 1;
        self.current_index = 0;
        self.phase = QuizPhase::InProgress;
        self.reset_question();
        Ok(())
    }

    pub fn view(&self) -> QuizView {
        let finished = self.phase == QuizPhase::Finished;
        let question = (!finished).then(|| {
            let current = self.current_question();
            QuestionView {
                question: current.question.clone(),
                options: current.options.clone(),
                correct_answer: self.is_answered.then(|| current.correct_answer.clone()),
            }
        });

        QuizView {
            phase: self.phase,
            attempt: self.attempt,
            index: self.current_index,
            total: self.total(),
            read_only: self.is_read_only(),
            question,
            selected_answer: self.selected_answer.clone(),
            is_answered: self.is_answered,
            time_remaining_secs: self.time_remaining.as_secs(),
            score: self.score(),
            grade: finished.then(|| grade(self.score(), self.total())),
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match self.phase {
            QuizPhase::InProgress => Ok(()),
            QuizPhase::Finished => Err(SessionError::Finished),
        }
    }

    fn ensure_accepts_input(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(SessionError::ReadOnly);
        }
        self.ensure_in_progress()?;
        if self.is_answered {
            return Err(SessionError::AlreadyAnswered {
                index: self.current_index,
            });
        }
        Ok(())
    }

    fn record(&mut self, answer: Option<String>) -> Submission {
        self.selected_answer = answer.clone();
        self.is_answered = true;

        let question = &mut self.questions[self.current_index];
        question.user_answer = answer.clone();

        Submission {
            index: self.current_index,
            correct: question.is_correct(),
            answer,
        }
    }

    /// Fresh countdown; review mode shows the recorded answer instead.
    fn reset_question(&mut self) {
        self.time_remaining = self.config.time_per_question;
        if self.is_read_only() {
            self.selected_answer = self.questions[self.current_index].user_answer.clone();
            self.is_answered = true;
        } else {
            self.selected_answer = None;
            self.is_answered = false;
        }
    }
}
