//! Flashcard viewer state: position in the deck and which side is showing.

use serde::Serialize;

use crate::error::{Result, SessionError};
use crate::types::Flashcard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashcardView {
    pub index: usize,
    pub total: usize,
    pub is_flipped: bool,
    pub card: Flashcard,
}

#[derive(Debug, Clone)]
pub struct FlashcardSession {
    cards: Vec<Flashcard>,
    current_index: usize,
    is_flipped: bool,
}

impl FlashcardSession {
    pub fn new(cards: Vec<Flashcard>) -> Result<Self> {
        if cards.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            cards,
            current_index: 0,
            is_flipped: false,
        })
    }

    pub fn current(&self) -> &Flashcard {
        &self.cards[self.current_index]
    }

    pub fn index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn is_flipped(&self) -> bool {
        self.is_flipped
    }

    /// One-based position, as shown in "3 / 10".
    pub fn position(&self) -> usize {
        self.current_index + 1
    }

    /// Move forward. Returns false on the last card.
    pub fn next(&mut self) -> bool {
        if self.current_index + 1 >= self.total() {
            return false;
        }
        self.current_index += 1;
        self.is_flipped = false;
        true
    }

    /// Move back. Returns false on the first card.
    pub fn prev(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        self.is_flipped = false;
        true
    }

    /// Toggle between question and answer. Returns the new side.
    pub fn flip(&mut self) -> bool {
        self.is_flipped = !self.is_flipped;
        self.is_flipped
    }

    pub fn view(&self) -> FlashcardView {
        FlashcardView {
            index: self.current_index,
            total: self.total(),
            is_flipped: self.is_flipped,
            card: self.current().clone(),
        }
    }
}
