//! Live quiz and flashcard sessions held in memory.
//!
//! Each quiz sits behind its own async mutex. Its countdown is a spawned task
//! that holds a weak reference and a [`CountdownTicket`]; the task stops as
//! soon as the ticket no longer matches, and is aborted on submit, advance,
//! retry and end. When the quiz is configured to auto-advance, the same task
//! moves past a timed-out question after the configured delay.
//!
//! Sessions the client stops using are evicted by [`spawn_sweeper`] once they
//! have been idle for the registry's TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use study_core::session::{Advance, CountdownTicket, FlashcardView, QuizView, Tick};
use study_core::{FlashcardSession, QuizSession, SessionError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::services::history::FinishedQuiz;

const TICK: Duration = Duration::from_secs(1);

/// Upper bound on the time between two idle sweeps.
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct LiveQuiz {
    id: Uuid,
    owner: Uuid,
    input_text: String,
    session: QuizSession,
    countdown: Option<JoinHandle<()>>,
    finished: UnboundedSender<FinishedQuiz>,
}

impl LiveQuiz {
    fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    fn restart_countdown(&mut self, quiz: &Arc<AsyncMutex<LiveQuiz>>) {
        self.stop_countdown();
        if let Some(ticket) = self.session.ticket() {
            self.countdown = Some(spawn_countdown(Arc::downgrade(quiz), ticket));
        }
    }

    /// Move past the current question. A finished attempt is handed to the
    /// history writer.
    fn advance(&mut self, quiz: &Arc<AsyncMutex<LiveQuiz>>) -> std::result::Result<(), SessionError> {
        match self.session.advance()? {
            Advance::Next { .. } => self.restart_countdown(quiz),
            Advance::Finished { snapshot } => {
                self.stop_countdown();
                if let Some(snapshot) = snapshot {
                    tracing::info!(
                        session_id = %self.id,
                        attempt = snapshot.attempt,
                        score = snapshot.score,
                        total = snapshot.total,
                        "Quiz finished"
                    );
                    let finished = FinishedQuiz {
                        user_id: self.owner,
                        input_text: self.input_text.clone(),
                        snapshot,
                    };
                    if self.finished.send(finished).is_err() {
                        tracing::warn!(session_id = %self.id, "History writer is gone; quiz result not saved");
                    }
                }
            }
        }
        Ok(())
    }
}

impl Drop for LiveQuiz {
    fn drop(&mut self) {
        self.stop_countdown();
    }
}

fn spawn_countdown(quiz: Weak<AsyncMutex<LiveQuiz>>, ticket: CountdownTicket) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        let delay = loop {
            interval.tick().await;

            let Some(quiz) = quiz.upgrade() else {
                return;
            };
            let mut live = quiz.lock().await;
            if live.session.ticket() != Some(ticket) {
                return;
            }

            match live.session.tick() {
                Tick::Running { .. } => {}
                Tick::Expired => {
                    tracing::debug!(
                        attempt = ticket.attempt,
                        index = ticket.index,
                        "Question timed out"
                    );
                    match live.session.config().auto_advance_after {
                        Some(delay) => break delay,
                        None => return,
                    }
                }
                Tick::Idle => return,
            }
        };

        sleep(delay).await;

        let Some(quiz) = quiz.upgrade() else {
            return;
        };
        let mut live = quiz.lock().await;
        if !live.session.awaits_advance(ticket) {
            return;
        }
        // Detach this task's own handle so the next countdown does not abort it.
        drop(live.countdown.take());
        if let Err(e) = live.advance(&quiz) {
            tracing::warn!(session_id = %live.id, "Auto-advance failed: {}", e);
        }
    })
}

struct QuizEntry {
    owner: Uuid,
    quiz: Arc<AsyncMutex<LiveQuiz>>,
    last_touched: Instant,
}

struct LiveFlashcards {
    owner: Uuid,
    session: FlashcardSession,
    last_touched: Instant,
}

/// In-memory store of running sessions, keyed by session id.
pub struct SessionRegistry {
    quizzes: Mutex<HashMap<Uuid, QuizEntry>>,
    flashcards: Mutex<HashMap<Uuid, LiveFlashcards>>,
    finished: UnboundedSender<FinishedQuiz>,
    idle_ttl: Duration,
}

fn poisoned<T>(_: T) -> ApiError {
    ApiError::Internal("session registry lock poisoned".to_string())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Session not found".to_string())
}

/// Evict idle sessions from `registry` until it is dropped.
pub fn spawn_sweeper(registry: &Arc<SessionRegistry>) -> JoinHandle<()> {
    let period = registry.idle_ttl.min(SWEEP_PERIOD);
    let registry = Arc::downgrade(registry);

    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;

            let Some(registry) = registry.upgrade() else {
                return;
            };
            match registry.sweep_idle() {
                Ok(0) => {}
                Ok(evicted) => tracing::info!(evicted, "Evicted idle sessions"),
                Err(e) => tracing::error!("Idle session sweep failed: {}", e),
            }
        }
    })
}

impl SessionRegistry {
    /// Finished quiz attempts are sent to `finished`. Sessions untouched for
    /// `idle_ttl` are dropped by the next sweep.
    pub fn new(finished: UnboundedSender<FinishedQuiz>, idle_ttl: Duration) -> Self {
        Self {
            quizzes: Mutex::new(HashMap::new()),
            flashcards: Mutex::new(HashMap::new()),
            finished,
            idle_ttl,
        }
    }

    /// Drop every session idle for at least the TTL and return how many went.
    pub fn sweep_idle(&self) -> Result<usize> {
        let now = Instant::now();
        let live = |last_touched: Instant| now.duration_since(last_touched) < self.idle_ttl;

        let mut evicted = 0;
        {
            let mut quizzes = self.quizzes.lock().map_err(poisoned)?;
            let before = quizzes.len();
            quizzes.retain(|_, entry| live(entry.last_touched));
            evicted += before - quizzes.len();
        }
        {
            let mut flashcards = self.flashcards.lock().map_err(poisoned)?;
            let before = flashcards.len();
            flashcards.retain(|_, entry| live(entry.last_touched));
            evicted += before - flashcards.len();
        }
        Ok(evicted)
    }

    // === Quiz ===

    pub async fn start_quiz(
        &self,
        owner: Uuid,
        input_text: String,
        session: QuizSession,
    ) -> Result<(Uuid, QuizView)> {
        let id = Uuid::new_v4();
        let quiz = Arc::new(AsyncMutex::new(LiveQuiz {
            id,
            owner,
            input_text,
            session,
            countdown: None,
            finished: self.finished.clone(),
        }));

        let view = {
            let mut live = quiz.lock().await;
            live.restart_countdown(&quiz);
            live.session.view()
        };

        let entry = QuizEntry {
            owner,
            quiz,
            last_touched: Instant::now(),
        };
        self.quizzes.lock().map_err(poisoned)?.insert(id, entry);
        tracing::info!(%owner, session_id = %id, total = view.total, read_only = view.read_only, "Quiz started");

        Ok((id, view))
    }

    /// Lock a quiz owned by `owner`. Other users' sessions are reported as missing.
    async fn locked_quiz(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<(Arc<AsyncMutex<LiveQuiz>>, OwnedMutexGuard<LiveQuiz>)> {
        let quiz = {
            let mut quizzes = self.quizzes.lock().map_err(poisoned)?;
            match quizzes.get_mut(&id) {
                Some(entry) if entry.owner == owner => {
                    entry.last_touched = Instant::now();
                    entry.quiz.clone()
                }
                _ => return Err(not_found()),
            }
        };
        let live = quiz.clone().lock_owned().await;
        Ok((quiz, live))
    }

    pub async fn quiz_view(&self, owner: Uuid, id: Uuid) -> Result<QuizView> {
        let (_, live) = self.locked_quiz(owner, id).await?;
        Ok(live.session.view())
    }

    pub async fn select(&self, owner: Uuid, id: Uuid, option: &str) -> Result<QuizView> {
        let (_, mut live) = self.locked_quiz(owner, id).await?;
        live.session.select(option)?;
        Ok(live.session.view())
    }

    pub async fn submit(&self, owner: Uuid, id: Uuid) -> Result<QuizView> {
        let (_, mut live) = self.locked_quiz(owner, id).await?;
        let submission = live.session.submit()?;
        live.stop_countdown();

        tracing::debug!(session_id = %id, index = submission.index, correct = submission.correct, "Answer submitted");
        Ok(live.session.view())
    }

    pub async fn advance(&self, owner: Uuid, id: Uuid) -> Result<QuizView> {
        let (quiz, mut live) = self.locked_quiz(owner, id).await?;
        live.advance(&quiz)?;
        Ok(live.session.view())
    }

    pub async fn retry(&self, owner: Uuid, id: Uuid) -> Result<QuizView> {
        let (quiz, mut live) = self.locked_quiz(owner, id).await?;
        live.session.retry()?;
        live.restart_countdown(&quiz);
        Ok(live.session.view())
    }

    /// Abandon a quiz. Nothing is saved.
    pub async fn end_quiz(&self, owner: Uuid, id: Uuid) -> Result<()> {
        let (_, mut live) = self.locked_quiz(owner, id).await?;
        live.stop_countdown();
        self.quizzes.lock().map_err(poisoned)?.remove(&id);
        Ok(())
    }

    // === Flashcards ===

    pub fn start_flashcards(&self, owner: Uuid, session: FlashcardSession) -> Result<(Uuid, FlashcardView)> {
        let id = Uuid::new_v4();
        let view = session.view();
        self.flashcards.lock().map_err(poisoned)?.insert(
            id,
            LiveFlashcards {
                owner,
                session,
                last_touched: Instant::now(),
            },
        );
        Ok((id, view))
    }

    fn with_flashcards<T>(
        &self,
        owner: Uuid,
        id: Uuid,
        f: impl FnOnce(&mut FlashcardSession) -> T,
    ) -> Result<T> {
        let mut sessions = self.flashcards.lock().map_err(poisoned)?;
        match sessions.get_mut(&id) {
            Some(live) if live.owner == owner => {
                live.last_touched = Instant::now();
                Ok(f(&mut live.session))
            }
            _ => Err(not_found()),
        }
    }

    pub fn flashcard_view(&self, owner: Uuid, id: Uuid) -> Result<FlashcardView> {
        self.with_flashcards(owner, id, |session| session.view())
    }

    pub fn next_card(&self, owner: Uuid, id: Uuid) -> Result<FlashcardView> {
        self.with_flashcards(owner, id, |session| {
            session.next();
            session.view()
        })
    }

    pub fn prev_card(&self, owner: Uuid, id: Uuid) -> Result<FlashcardView> {
        self.with_flashcards(owner, id, |session| {
            session.prev();
            session.view()
        })
    }

    pub fn flip_card(&self, owner: Uuid, id: Uuid) -> Result<FlashcardView> {
        self.with_flashcards(owner, id, |session| {
            session.flip();
            session.view()
        })
    }

    pub fn end_flashcards(&self, owner: Uuid, id: Uuid) -> Result<()> {
        let mut sessions = self.flashcards.lock().map_err(poisoned)?;
        match sessions.get(&id) {
            Some(live) if live.owner == owner => {
                sessions.remove(&id);
                Ok(())
            }
            _ => Err(not_found()),
        }
    }
}
