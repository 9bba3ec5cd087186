//! Slide extraction: per-page text with a title/content split.
//!
//! ## Two backends
//!
//! `pdf-extract` produces noticeably better text for most presentation
//! exports, so it is tried first. Some documents make it bail (unusual
//! encodings, odd content streams); those fall back to `lopdf`, which
//! extracts page by page and tolerates more damage at the cost of rougher
//! output. Either way the caller receives the same shape: one [`Slide`]
//! per page, in page order.
//!
//! Both backends are synchronous, so the whole extraction runs inside
//! `tokio::task::spawn_blocking`.

use crate::error::Pdf2AnkiError;
use crate::output::Slide;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extract one [`Slide`] per page of the PDF, in page order.
///
/// Pages are emitted even when nearly empty; the meaningful-content gate
/// downstream decides what to skip. Returns an error only when *both*
/// backends fail to read the document.
pub async fn extract_slides(pdf_path: &Path) -> Result<Vec<Slide>, Pdf2AnkiError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || extract_slides_blocking(&path))
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation: pdf-extract first, lopdf fallback.
fn extract_slides_blocking(pdf_path: &Path) -> Result<Vec<Slide>, Pdf2AnkiError> {
    match pdf_extract::extract_text_by_pages(pdf_path) {
        Ok(pages) => {
            info!("Extracted {} pages via pdf-extract", pages.len());
            Ok(pages
                .iter()
                .enumerate()
                .map(|(i, text)| slide_from_page_text(text, i + 1))
                .collect())
        }
        Err(e) => {
            warn!(
                "pdf-extract failed ({}), falling back to lopdf (less accurate extraction)",
                e
            );
            extract_with_lopdf(pdf_path, &e.to_string())
        }
    }
}

/// Fallback backend: load with lopdf and extract each page separately.
fn extract_with_lopdf(pdf_path: &Path, primary_error: &str) -> Result<Vec<Slide>, Pdf2AnkiError> {
    let doc = lopdf::Document::load(pdf_path).map_err(|e| Pdf2AnkiError::ExtractionFailed {
        path: pdf_path.to_path_buf(),
        detail: format!("pdf-extract: {primary_error}; lopdf: {e}"),
    })?;

    let mut slides = Vec::new();
    for (i, page_num) in doc.get_pages().keys().enumerate() {
        // A single unreadable page degrades to an empty slide; the gate
        // will skip it.
        let text = match doc.extract_text(&[*page_num]) {
            Ok(t) => t,
            Err(e) => {
                warn!("lopdf could not extract page {}: {}", page_num, e);
                String::new()
            }
        };
        slides.push(slide_from_page_text(&text, i + 1));
    }

    info!("Extracted {} pages via lopdf", slides.len());
    Ok(slides)
}

/// Split raw page text into a title/content pair.
///
/// The first non-empty line becomes the title; the remaining non-empty
/// lines, joined with `\n`, become the content. A page of pure whitespace
/// yields an empty title and content (and will be skipped downstream).
pub fn slide_from_page_text(text: &str, slide_num: usize) -> Slide {
    let clean_lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let (title, content) = match clean_lines.split_first() {
        Some((first, rest)) => (
            first.trim().to_string(),
            rest.join("\n").trim().to_string(),
        ),
        None => (String::new(), String::new()),
    };

    debug!(
        "Extracted slide {}: title={:?}, content length={}",
        slide_num,
        title,
        content.len()
    );

    Slide {
        title,
        content,
        slide_num,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_nonempty_line_becomes_title() {
        let s = slide_from_page_text("\n\n  Vi Editor Basics  \nInsert mode\nNormal mode\n", 3);
        assert_eq!(s.title, "Vi Editor Basics");
        assert_eq!(s.content, "Insert mode\nNormal mode");
        assert_eq!(s.slide_num, 3);
    }

    #[test]
    fn blank_lines_inside_content_are_dropped() {
        let s = slide_from_page_text("Title\n\nline one\n\n\nline two\n", 1);
        assert_eq!(s.content, "line one\nline two");
    }

    #[test]
    fn whitespace_only_page_yields_empty_slide() {
        let s = slide_from_page_text("   \n\t\n", 5);
        assert_eq!(s.title, "");
        assert_eq!(s.content, "");
        assert!(!s.has_meaningful_content());
    }

    #[test]
    fn single_line_page_has_empty_content() {
        let s = slide_from_page_text("Conclusions", 9);
        assert_eq!(s.title, "Conclusions");
        assert_eq!(s.content, "");
    }
}
