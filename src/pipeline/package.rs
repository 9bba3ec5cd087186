//! Deck packaging: wrap generated cards into an Anki deck and write the
//! `.apkg` file via genanki.
//!
//! Deck and note-model identifiers are random `i64`s in `[2^30, 2^31)`,
//! unique per run (collisions are accepted as negligible; Anki only uses
//! them to distinguish decks/models on import). Callers that need
//! reproducible packages inject fixed ids through
//! [`crate::config::ConversionConfig`].

use crate::error::Pdf2AnkiError;
use crate::output::Card;
use genanki_rs::{Deck, Field, Model, Note, Package, Template};
use rand::Rng;
use std::path::Path;
use tracing::info;

/// Name of the genanki note model used for every card.
pub const CARD_MODEL_NAME: &str = "AI Presentation Card";

/// Draw a fresh identifier in `[2^30, 2^31)`, the range Anki expects for
/// deck and model ids.
pub fn random_package_id() -> i64 {
    rand::thread_rng().gen_range((1_i64 << 30)..(1_i64 << 31))
}

/// The four-field question/answer note model with the slide reference on
/// the back of the card.
pub fn card_model(model_id: i64) -> Model {
    Model::new(
        model_id,
        CARD_MODEL_NAME,
        vec![
            Field::new("Question"),
            Field::new("Answer"),
            Field::new("Slide"),
            Field::new("Context"),
        ],
        vec![Template::new("Card")
            .qfmt("{{Question}}")
            .afmt(r#"{{FrontSide}}<hr id="answer">{{Answer}}<br><br><i>Slide: {{Slide}}</i>"#)],
    )
}

/// Assemble a deck from the card list, preserving input order 1:1.
pub fn build_deck(
    cards: &[Card],
    deck_name: &str,
    deck_id: i64,
    model_id: i64,
) -> Result<Deck, Pdf2AnkiError> {
    let model = card_model(model_id);
    let mut deck = Deck::new(deck_id, deck_name, "Generated from a PDF presentation");

    for card in cards {
        let note = Note::new(
            model.clone(),
            vec![&card.question, &card.answer, &card.slide, &card.context],
        )
        .map_err(|e| Pdf2AnkiError::Internal(format!("note construction failed: {e}")))?;
        deck.add_note(note);
    }

    Ok(deck)
}

/// Serialize the deck to a single `.apkg` file.
///
/// Blocking (genanki writes through SQLite); call from `spawn_blocking`
/// in async contexts.
pub fn write_package(deck: Deck, output_path: &Path) -> Result<(), Pdf2AnkiError> {
    let path_str = output_path
        .to_str()
        .ok_or_else(|| Pdf2AnkiError::Internal("non-UTF-8 output path".to_string()))?;

    let mut package =
        Package::new(vec![deck], vec![]).map_err(|e| Pdf2AnkiError::PackageWriteFailed {
            path: output_path.to_path_buf(),
            detail: e.to_string(),
        })?;

    package
        .write_to_file(path_str)
        .map_err(|e| Pdf2AnkiError::PackageWriteFailed {
            path: output_path.to_path_buf(),
            detail: e.to_string(),
        })?;

    info!("Wrote Anki package: {}", output_path.display());
    Ok(())
}
