//! Multiple-choice quiz parser.
//!
//! # Format
//! ```text
//! Question: What is 2+2?
//! A. 3
//! B. 4
//! C. 5
//! Answer: B
//! ```
//!
//! Filipino markers (`Tanong:` / `Sagot:`) are accepted as well, and all
//! markers are case-insensitive. Options may use `.` or `)` after the letter.
//!
//! The answer letter is resolved by position in the parsed option list, not
//! by the letter printed in front of each option.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::QuizQuestion;

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:question|tanong):").expect("block pattern is valid"));

static QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:question|tanong):[ \t]*([^\r\n]*)").expect("question pattern is valid")
});

static OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Da-d])[.)][ \t]*([^\r\n]+)").expect("option pattern is valid")
});

static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:answer|sagot):\s*([A-D])").expect("answer pattern is valid")
});

/// Parse model output into quiz questions, in order of appearance.
pub fn parse_quiz(raw: &str) -> Vec<QuizQuestion> {
    split_blocks(raw.trim())
        .into_iter()
        .filter_map(parse_block)
        .collect()
}

/// Split right before every question marker, keeping the marker with its block.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut bounds: Vec<usize> = BLOCK_START.find_iter(text).map(|m| m.start()).collect();
    if bounds.first() != Some(&0) {
        bounds.insert(0, 0);
    }

    bounds
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = bounds.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

fn parse_block(block: &str) -> Option<QuizQuestion> {
    let question = QUESTION.captures(block)?[1].trim().to_string();

    let options: Vec<String> = OPTION
        .captures_iter(block)
        .map(|caps| caps[2].trim().to_string())
        .filter(|option| !option.is_empty())
        .collect();

    let letter = ANSWER.captures(block)?[1].to_ascii_uppercase();
    let correct_answer = resolve_answer(&letter, &options).unwrap_or_default();

    if question.is_empty() || options.is_empty() || correct_answer.is_empty() {
        return None;
    }

    Some(QuizQuestion {
        question,
        options,
        correct_answer,
        user_answer: None,
    })
}

fn resolve_answer(letter: &str, options: &[String]) -> Option<String> {
    let index = "ABCD".find(letter)?;
    options.get(index).cloned()
}
