//! Error types for the pdf2anki library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2AnkiError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input file, missing API key, package write failure). Returned as
//!   `Err(Pdf2AnkiError)` from the top-level `convert*` functions.
//!
//! * [`SlideError`] — **Non-fatal**: card generation failed for a single
//!   slide after all retries. Stored inside
//!   [`crate::output::SlideResult`] so callers can inspect the degraded
//!   slides rather than losing the whole deck to one bad API call.
//!
//! A malformed model response is *neither*: the recovery chain in
//! [`crate::pipeline::recover`] absorbs it and always produces at least
//! one card.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2anki library.
///
/// Slide-level failures use [`SlideError`] and are stored in
/// [`crate::output::SlideResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2AnkiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The input has a file extension other than `.pdf`.
    ///
    /// Checked before any extraction or network call so unsupported
    /// formats are reported immediately.
    #[error("Unsupported file format '{extension}' for '{path}'\nOnly .pdf presentations are supported.")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Both text-extraction backends failed on the document.
    #[error("Text extraction failed for '{path}': {detail}\nThe PDF may be scanned images with no text layer.")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No API key in the config, the environment, or the client slot.
    #[error(
        "No API key configured.\n\
         Set DEEPSEEK_API_KEY in the environment (or a .env file), or pass --api-key."
    )]
    ApiKeyMissing,

    /// The completion API returned a non-success response.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// genanki packaging or the .apkg write failed.
    #[error("Failed to write Anki package '{path}': {detail}")]
    PackageWriteFailed { path: PathBuf, detail: String },

    /// Could not create or write a non-package output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single slide.
///
/// Stored alongside [`crate::output::SlideResult`] when every generation
/// attempt for a slide failed. The overall conversion continues; the slide
/// degrades to the synthetic fallback card when a title is available.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlideError {
    /// LLM call failed after all retries.
    #[error("Slide {slide}: card generation failed after {retries} attempts: {detail}")]
    GenerationFailed {
        slide: usize,
        retries: u32,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = Pdf2AnkiError::UnsupportedFormat {
            path: PathBuf::from("deck.pptx"),
            extension: ".pptx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".pptx"), "got: {msg}");
        assert!(msg.contains("Only .pdf"));
    }

    #[test]
    fn api_key_missing_display() {
        let e = Pdf2AnkiError::ApiKeyMissing;
        assert!(e.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn generation_failed_display() {
        let e = SlideError::GenerationFailed {
            slide: 7,
            retries: 3,
            detail: "connection reset".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Slide 7"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn package_write_failed_display() {
        let e = Pdf2AnkiError::PackageWriteFailed {
            path: PathBuf::from("/tmp/out.apkg"),
            detail: "disk full".into(),
        };
        assert!(e.to_string().contains("out.apkg"));
        assert!(e.to_string().contains("disk full"));
    }
}
