//! # pdf2anki
//!
//! Convert PDF slide decks into Anki flashcard packages using an LLM.
//!
//! ## Why this crate?
//!
//! Turning lecture slides into spaced-repetition cards by hand is slow and
//! most of the work is mechanical: read a slide, ask the obvious questions,
//! write them down. This crate automates the loop — extract the text of
//! every slide, hand each one to a chat model with a fixed card-writing
//! prompt, and pack the results into a ready-to-import `.apkg` deck. Model
//! output is salvaged through a five-stage recovery chain, so a run always
//! produces a reviewable deck even when the model misbehaves.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Extract  per-page text via pdf-extract (lopdf fallback)
//!  ├─ 3. Clean    strip boilerplate titles, promote real ones
//!  ├─ 4. Generate sequential chat calls, 3 attempts per slide
//!  ├─ 5. Recover  5-stage salvage of the model response
//!  └─ 6. Package  genanki deck → .apkg + per-slide stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2anki::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from DEEPSEEK_API_KEY when not set explicitly
//!     let config = ConversionConfig::builder()
//!         .deck_name("Operating Systems — Week 3")
//!         .build()?;
//!     let stats = convert_to_file("lecture3.pdf", "lecture3_flashcards.apkg", &config).await?;
//!     eprintln!("{} cards from {} slides", stats.total_cards, stats.total_slides);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2anki` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2anki = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    convert, convert_to_file, convert_to_file_sync, default_output_path, inspect,
};
pub use error::{Pdf2AnkiError, SlideError};
pub use output::{Card, ConversionOutput, ConversionStats, Slide, SlideResult};
pub use pipeline::llm::{ChatMessage, CompletionClient, CompletionOptions, DeepSeekClient};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
