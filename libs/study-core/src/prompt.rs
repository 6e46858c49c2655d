//! Prompts sent to the chat model for each kind of study material.
//!
//! The wording pins the output format the parsers expect: `Q:`/`A:` lines
//! for flashcards and `Question:`/`Answer:` (or `Tanong:`/`Sagot:`) blocks
//! for quizzes.

use crate::types::{Language, SummaryFormat, SummaryLength};

/// Largest number of flashcards or questions a single request may ask for.
pub const MAX_ITEMS: u32 = 10;

/// System and user messages for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn flashcards(input: &str, count: u32, language: Language) -> Prompt {
    let system = "You are an AI study assistant that creates flashcards to support active recall and efficient review.".to_string();

    let user = format!(
        "Create exactly {count} flashcards based on the **key concepts and important ideas** from the text below.\n\
         \n\
         Strict formatting rules:\n\
         1. Each flashcard must start with \"Q:\" on a NEW line, followed by a clear and concise question.\n\
         2. The answer must start with \"A:\" on the NEXT line and directly answer the question.\n\
         3. Each Q&A pair must represent ONE flashcard only.\n\
         4. Do NOT merge multiple questions or answers.\n\
         5. Do NOT add numbering, headings, or extra explanations.\n\
         6. Generate EXACTLY {count} flashcards.\n\
         7. Write in {language}.\n\
         \n\
         Focus on:\n\
         - Main concepts\n\
         - Definitions\n\
         - Relationships between ideas\n\
         - Important facts useful for review\n\
         \n\
         Text:\n\
         {input}",
        language = language.as_str(),
    );

    Prompt { system, user }
}

pub fn quiz(input: &str, count: u32, language: Language) -> Prompt {
    match language {
        Language::Filipino => Prompt {
            system: format!(
                "Ikaw ay isang AI quiz generator. Gumawa ng eksaktong {count} multiple-choice na tanong mula sa ibinigay na teksto.\n\
                 Gamitin ang eksaktong format na ito:\n\
                 Tanong: <question text>\n\
                 A. <choice1>\n\
                 B. <choice2>\n\
                 C. <choice3>\n\
                 D. <choice4>\n\
                 Sagot: <tamang letra A-D>"
            ),
            user: format!(
                "Gumawa ng {count} tanong mula sa tekstong ito:\n\n{input}\n\nSundin ang format."
            ),
        },
        Language::English => Prompt {
            system: format!(
                "You are an AI quiz generator. Generate exactly {count} multiple-choice questions from the given text.\n\
                 If the text is not in English, translate it to English first.\n\
                 Use this exact format:\n\
                 Question: <question text>\n\
                 A. <choice1>\n\
                 B. <choice2>\n\
                 C. <choice3>\n\
                 D. <choice4>\n\
                 Answer: <correct letter A-D>"
            ),
            user: format!(
                "Generate {count} questions from this text:\n\n{input}\n\nTranslate to English if needed, and follow the format exactly."
            ),
        },
    }
}

pub fn summary(input: &str, language: Language, length: SummaryLength, format: SummaryFormat) -> Prompt {
    let extent = match (length, format) {
        (SummaryLength::Short, SummaryFormat::Bullet) => "3-4 points",
        (SummaryLength::Medium, SummaryFormat::Bullet) => "5-7 points",
        (SummaryLength::Long, SummaryFormat::Bullet) => "8-10 points",
        (SummaryLength::Short, SummaryFormat::Paragraph) => "2-3 sentences",
        (SummaryLength::Medium, SummaryFormat::Paragraph) => "5-7 sentences",
        (SummaryLength::Long, SummaryFormat::Paragraph) => "8-12 sentences",
    };

    let (system, user) = match (format, language) {
        (SummaryFormat::Bullet, Language::Filipino) => (
            format!("Ikaw ay isang AI study assistant. Buodin ang ibinigay na teksto bilang **bullet points lamang**, {extent}. Huwag maglagay ng anumang panimulang teksto o markdown."),
            format!("Buodin ang tekstong ito sa bullet points lamang:\n{input}"),
        ),
        (SummaryFormat::Bullet, Language::English) => (
            format!("You are an AI study assistant. Summarize the given text as **bullet points only**, {extent}. Do NOT include any introductory text or markdown."),
            format!("Summarize this text in bullet points only:\n{input}"),
        ),
        (SummaryFormat::Paragraph, Language::Filipino) => (
            format!("Ikaw ay isang AI study assistant. Buodin ang ibinigay na teksto sa malinaw at maikling paraan bilang **isang talata**, {extent}."),
            format!("Buodin ang tekstong ito sa isang talata:\n{input}"),
        ),
        (SummaryFormat::Paragraph, Language::English) => (
            format!("You are an AI study assistant. Summarize the given text clearly and concisely as **a paragraph**, {extent}."),
            format!("Summarize this text in a paragraph:\n{input}"),
        ),
    };

    Prompt { system, user }
}

/// Strip leftover bold markers from a summary reply.
pub fn clean_summary(text: &str) -> String {
    text.lines()
        .map(|line| line.replace("**", "").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whether `count` is an acceptable item count for one request.
pub fn is_valid_count(count: u32) -> bool {
    (1..=MAX_ITEMS).contains(&count)
}
