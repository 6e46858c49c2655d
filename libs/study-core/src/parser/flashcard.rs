//! Flashcard parser.
//!
//! # Format
//! ```text
//! Q: What is Rust?
//! A: A systems programming language.
//! Q: Explain borrowing
//! A: Borrowing allows references without ownership.
//! Multiple lines are supported.
//! ```
//!
//! Markers are case-sensitive and must start a line. An answer runs until
//! the next `Q:` line or the end of input.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Flashcard;

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Q:").expect("block start pattern is valid"));

static CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\AQ:(.*?)\r?\nA:(.*)\z").expect("card pattern is valid")
});

/// Parse model output into flashcards, in order of appearance.
pub fn parse_flashcards(raw: &str) -> Vec<Flashcard> {
    let starts: Vec<usize> = BLOCK_START.find_iter(raw).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(raw.len());
            parse_block(&raw[start..end])
        })
        .collect()
}

fn parse_block(block: &str) -> Option<Flashcard> {
    let caps = CARD.captures(block)?;
    let question = caps[1].trim();
    let answer = caps[2].trim();

    if question.is_empty() || answer.is_empty() {
        return None;
    }
    Some(Flashcard::new(question, answer))
}
