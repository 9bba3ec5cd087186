//! Prompts for LLM flashcard generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the default behaviour (card
//!    count, JSON shape, tone) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live API, making prompt regressions easy to catch.
//!
//! Callers can override the system prompt via
//! [`crate::config::ConversionConfig::system_prompt`]; the constants here
//! are used only when no override is provided.

/// Default system prompt for the chat completion request.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You create high-quality flashcards from educational content. \
     Always respond with valid JSON.";

/// Combine a slide's title and content into the text block the user
/// prompt embeds.
pub fn slide_text(title: &str, content: &str) -> String {
    format!("Title: {title}\n\nContent: {content}")
}

/// Build the per-slide user prompt asking for 1-5 question/answer pairs
/// as a JSON array.
///
/// The example array matters: models follow the demonstrated shape far
/// more reliably than the prose instruction alone.
pub fn card_prompt(slide_text: &str) -> String {
    format!(
        r#"Please analyze this slide content from an educational presentation and create 1-5 Anki flashcards based on the key concepts.

For each important concept, create a question that tests understanding and a comprehensive answer.

Slide content:
{slide_text}

Format your response as a JSON array of objects with 'question' and 'answer' keys.
Example:
[
    {{"question": "What is the capital of France?", "answer": "Paris"}},
    {{"question": "What is the formula for calculating area of a circle?", "answer": "A = πr²"}}
]

Only output valid JSON.

If there's not enough meaningful content to create flashcards, return an empty array: []"#
    )
}
