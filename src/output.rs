//! Output types: the data model flowing through the pipeline and the
//! result types returned by the `convert*` entry points.
//!
//! Everything here derives `Serialize` so the CLI `--json` mode can dump
//! the full conversion result without bespoke formatting code.

use crate::error::SlideError;
use serde::{Deserialize, Serialize};

/// One page of extracted presentation text with an inferred
/// title/content split.
///
/// Produced by [`crate::pipeline::extract`], one per page in page order,
/// then possibly retitled by [`crate::pipeline::clean`]. Immutable once
/// cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// First non-empty line of the page (post-cleaning: the best title guess).
    pub title: String,
    /// Remaining non-empty lines, joined with `\n`.
    pub content: String,
    /// 1-indexed page number.
    pub slide_num: usize,
}

impl Slide {
    /// The label stamped onto every card generated from this slide.
    pub fn label(&self) -> String {
        format!("Slide {}", self.slide_num)
    }

    /// Whether the slide carries enough text to be worth sending to the
    /// model: title longer than 3 characters or content longer than 10.
    pub fn has_meaningful_content(&self) -> bool {
        self.title.chars().count() > 3 || self.content.chars().count() > 10
    }
}

/// One question/answer flashcard tied to a source slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub question: String,
    pub answer: String,
    /// Non-empty slide label, e.g. `"Slide 4"`.
    pub slide: String,
    /// The cleaned slide title, or the auto-generated marker for
    /// fallback cards.
    pub context: String,
}

/// Per-slide outcome, fatal-free by construction.
///
/// `error` is set only when every API attempt failed; even then the slide
/// may have produced a fallback card (`fallback = true`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideResult {
    /// 1-indexed page number.
    pub slide_num: usize,
    /// Cleaned slide title.
    pub title: String,
    /// Cards appended to the deck for this slide.
    pub cards_generated: usize,
    /// Failed API attempts before the first success (0 on a clean run).
    pub retries: u32,
    /// True when the meaningful-content gate skipped the slide.
    pub skipped: bool,
    /// True when the card came from the synthetic fallback path.
    pub fallback: bool,
    /// Wall-clock time spent on this slide, including retry pauses.
    pub duration_ms: u64,
    /// Set when all attempts were exhausted.
    pub error: Option<SlideError>,
}

/// Aggregate statistics for one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_slides: usize,
    /// Slides that produced model-generated cards.
    pub processed_slides: usize,
    /// Slides skipped by the meaningful-content gate.
    pub skipped_slides: usize,
    /// Slides that degraded to the synthetic fallback card.
    pub fallback_slides: usize,
    /// Cards in the final deck.
    pub total_cards: usize,
    /// End-to-end duration.
    pub total_duration_ms: u64,
    /// Time spent extracting text from the PDF.
    pub extract_duration_ms: u64,
    /// Time spent in LLM calls (including retry pauses).
    pub llm_duration_ms: u64,
}

/// Complete result of a conversion, before packaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Deck name the cards are destined for.
    pub deck_name: String,
    /// All generated cards, in slide order.
    pub cards: Vec<Card>,
    /// One entry per slide, in page order.
    pub slides: Vec<SlideResult>,
    pub stats: ConversionStats,
}
