//! Progress-callback trait for per-slide conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through the deck.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a GUI thread, a database record, or a
//! terminal progress bar — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` so the
//! whole pipeline can run on a background worker while the owner observes
//! from another thread; no mutable state is shared in either direction.

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each slide.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Slides are processed sequentially, so calls for
/// different slides never overlap; implementations still must be
/// `Send + Sync` because the pipeline typically runs off the caller's
/// thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after extraction, before any slide is sent to the model.
    ///
    /// # Arguments
    /// * `total_slides` — number of slides extracted from the document
    fn on_conversion_start(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called just before the first API attempt for a slide.
    fn on_slide_start(&self, slide_num: usize, total_slides: usize) {
        let _ = (slide_num, total_slides);
    }

    /// Called when a slide was skipped by the meaningful-content gate.
    fn on_slide_skipped(&self, slide_num: usize, total_slides: usize) {
        let _ = (slide_num, total_slides);
    }

    /// Called when the model returned cards for a slide.
    ///
    /// # Arguments
    /// * `cards` — number of cards appended to the deck for this slide
    fn on_slide_complete(&self, slide_num: usize, total_slides: usize, cards: usize) {
        let _ = (slide_num, total_slides, cards);
    }

    /// Called when all attempts failed and the slide degraded to the
    /// synthetic fallback card (or to nothing, if the title was empty).
    ///
    /// # Arguments
    /// * `error` — human-readable description of the last attempt's failure
    fn on_slide_fallback(&self, slide_num: usize, total_slides: usize, error: &str) {
        let _ = (slide_num, total_slides, error);
    }

    /// Called once after all slides have been attempted.
    ///
    /// # Arguments
    /// * `total_slides` — slides in the document
    /// * `card_count`   — cards in the assembled deck
    fn on_conversion_complete(&self, total_slides: usize, card_count: usize) {
        let _ = (total_slides, card_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
