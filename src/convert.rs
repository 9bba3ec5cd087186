//! Conversion entry points: the whole pipeline behind one call.
//!
//! The pipeline runs strictly sequentially — extract, then one slide at a
//! time through clean → generate — and synchronously from the caller's
//! point of view. Callers that need a responsive UI run `convert_to_file`
//! on a background task and observe it through the progress callback; no
//! mutable state crosses back, only events and the final result.

use crate::config::ConversionConfig;
use crate::error::Pdf2AnkiError;
use crate::output::{ConversionOutput, ConversionStats, Slide, SlideResult};
use crate::pipeline::llm::{CompletionClient, DeepSeekClient};
use crate::pipeline::{clean, extract, input, llm, package};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file or URL into flashcards.
///
/// This is the primary entry point for the library. Packaging is left to
/// the caller (or use [`convert_to_file`] for the full path to `.apkg`).
///
/// # Arguments
/// * `input` — Local `.pdf` path or HTTP/HTTPS URL
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some slides degraded to
/// fallback cards (check `output.stats.fallback_slides`).
///
/// # Errors
/// Returns `Err(Pdf2AnkiError)` only for fatal errors:
/// - Missing API key (checked before any processing)
/// - File not found / unsupported format / not a valid PDF
/// - Both extraction backends failing
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2AnkiError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Resolve the completion client ────────────────────────────
    // A missing credential must surface before extraction or any network
    // call, so this comes first.
    let client = resolve_client(config)?;

    // ── Step 2: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 3: Extract slides ───────────────────────────────────────────
    let extract_start = Instant::now();
    let slides = extract::extract_slides(&pdf_path).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let total_slides = slides.len();
    info!(
        "Extracted {} slides in {}ms",
        total_slides, extract_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_slides);
    }

    // ── Step 4: Clean + generate, one slide at a time ────────────────────
    let llm_start = Instant::now();
    let mut cards = Vec::new();
    let mut slide_results: Vec<SlideResult> = Vec::with_capacity(total_slides);

    for slide in slides {
        let slide_start = Instant::now();
        let cleaned = clean::clean_slide(slide);

        if !cleaned.has_meaningful_content() {
            debug!(
                "Skipping slide {} - insufficient content",
                cleaned.slide_num
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_slide_skipped(cleaned.slide_num, total_slides);
            }
            slide_results.push(SlideResult {
                slide_num: cleaned.slide_num,
                title: cleaned.title,
                cards_generated: 0,
                retries: 0,
                skipped: true,
                fallback: false,
                duration_ms: slide_start.elapsed().as_millis() as u64,
                error: None,
            });
            continue;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_start(cleaned.slide_num, total_slides);
        }

        let outcome = llm::generate_cards(&client, &cleaned, config).await;

        if let Some(ref cb) = config.progress_callback {
            match &outcome.error {
                None => cb.on_slide_complete(cleaned.slide_num, total_slides, outcome.cards.len()),
                Some(e) => cb.on_slide_fallback(cleaned.slide_num, total_slides, &e.to_string()),
            }
        }

        slide_results.push(SlideResult {
            slide_num: cleaned.slide_num,
            title: cleaned.title,
            cards_generated: outcome.cards.len(),
            retries: outcome.retries,
            skipped: false,
            fallback: outcome.fallback,
            duration_ms: slide_start.elapsed().as_millis() as u64,
            error: outcome.error,
        });
        cards.extend(outcome.cards);
    }
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 5: Compute stats ────────────────────────────────────────────
    let processed = slide_results
        .iter()
        .filter(|r| !r.skipped && !r.fallback)
        .count();
    let skipped = slide_results.iter().filter(|r| r.skipped).count();
    let fallback = slide_results.iter().filter(|r| r.fallback).count();

    let stats = ConversionStats {
        total_slides,
        processed_slides: processed,
        skipped_slides: skipped,
        fallback_slides: fallback,
        total_cards: cards.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extract_duration_ms,
        llm_duration_ms,
    };

    info!(
        "Conversion complete: {} cards from {}/{} slides, {}ms total",
        stats.total_cards, processed, total_slides, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_slides, stats.total_cards);
    }

    Ok(ConversionOutput {
        deck_name: config.deck_name.clone(),
        cards,
        slides: slide_results,
        stats,
    })
}

/// Convert a PDF and write the Anki package to `output_path`.
///
/// Deck and model identifiers come from the config when set, otherwise a
/// fresh random draw per run.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2AnkiError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref().to_path_buf();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Pdf2AnkiError::OutputWriteFailed {
                    path: path.clone(),
                    source: e,
                }
            })?;
        }
    }

    let deck_id = config.deck_id.unwrap_or_else(package::random_package_id);
    let model_id = config.model_id.unwrap_or_else(package::random_package_id);
    let deck_name = output.deck_name.clone();
    let cards = output.cards;
    let write_path = path.clone();

    // genanki writes through SQLite; keep it off the async runtime.
    tokio::task::spawn_blocking(move || {
        let deck = package::build_deck(&cards, &deck_name, deck_id, model_id)?;
        package::write_package(deck, &write_path)
    })
    .await
    .map_err(|e| Pdf2AnkiError::Internal(format!("Packaging task panicked: {}", e)))??;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_to_file_sync(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2AnkiError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2AnkiError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_file(input_str, output_path, config))
}

/// Extract and clean slides without generating any cards.
///
/// Does not require an API key; useful for previewing what the deck would
/// cover. Only `config.download_timeout_secs` is consulted, so
/// `ConversionConfig::default()` is fine for local files.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<Vec<Slide>, Pdf2AnkiError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let slides = extract::extract_slides(resolved.path()).await?;
    Ok(slides.into_iter().map(clean::clean_slide).collect())
}

/// Default output location: `{input-base-name}_flashcards.apkg` in the
/// user's Downloads directory (current directory when no Downloads
/// directory exists, e.g. on headless systems).
pub fn default_output_path(input_str: &str) -> PathBuf {
    let base = Path::new(input_str)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("deck");

    let dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(format!("{base}_flashcards.apkg"))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the completion client, from most-specific to least-specific:
///
/// 1. **Pre-built client** (`config.client`) — the caller constructed and
///    configured the client entirely; we use it as-is. This is the
///    injection point tests use.
/// 2. **Configured key** (`config.api_key`) with the configured base URL
///    and model.
/// 3. **Environment** — `DEEPSEEK_API_KEY`.
///
/// A missing credential is fatal and reported before any processing.
fn resolve_client(config: &ConversionConfig) -> Result<Arc<dyn CompletionClient>, Pdf2AnkiError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let key = match config.api_key.clone() {
        Some(k) if !k.is_empty() => k,
        _ => match std::env::var("DEEPSEEK_API_KEY") {
            Ok(k) if !k.is_empty() => k,
            _ => return Err(Pdf2AnkiError::ApiKeyMissing),
        },
    };

    let client = DeepSeekClient::new(key, &config.base_url, &config.model, config.api_timeout_secs)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_uses_input_stem() {
        let p = default_output_path("/home/user/lectures/week3.pdf");
        assert!(p
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .eq("week3_flashcards.apkg"));
    }

    #[test]
    fn default_output_path_handles_urls() {
        let p = default_output_path("https://example.com/slides/intro.pdf");
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "intro_flashcards.apkg"
        );
    }

    #[tokio::test]
    async fn inspect_needs_no_api_key() {
        // No key anywhere in the config; a local-file failure must be the
        // input error, not ApiKeyMissing.
        let config = ConversionConfig::default();
        let err = inspect("/no/such/dir/deck.pdf", &config).await.unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::FileNotFound { .. }));
    }

    #[test]
    fn configured_key_beats_environment() {
        let config = ConversionConfig::builder().api_key("sk-test").build().unwrap();
        assert!(resolve_client(&config).is_ok());
    }
}
