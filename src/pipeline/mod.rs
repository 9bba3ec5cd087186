//! Pipeline stages for PDF-to-flashcards conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch extraction backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean ──▶ llm ──▶ recover ──▶ package
//! (URL/path) (per-page  (title    (chat    (JSON       (.apkg)
//!             text)      fixup)    API)     salvage)
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`] — per-page text with a title/content split; runs in
//!    `spawn_blocking` because both PDF backends are synchronous
//! 3. [`clean`]   — boilerplate-title heuristics, pure per-slide function
//! 4. [`llm`]     — drive the chat call with the fixed retry loop; the only
//!    stage with network I/O
//! 5. [`recover`] — extract question/answer pairs from the response, however
//!    malformed; never fails
//! 6. [`package`] — wrap cards into a genanki deck and write the `.apkg`

pub mod clean;
pub mod extract;
pub mod input;
pub mod llm;
pub mod package;
pub mod recover;
