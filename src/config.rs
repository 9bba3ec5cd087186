//! Configuration types for PDF-to-flashcards conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`],
//! built via its [`ConversionConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to hand the whole configuration to a background
//! worker, log it, and diff two runs to understand why their decks differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new
//! field. The builder lets callers set only what they care about and rely
//! on documented defaults for the rest.

use crate::error::Pdf2AnkiError;
use crate::pipeline::llm::CompletionClient;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Configuration for a PDF-to-flashcards conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2anki::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .deck_name("Operating Systems — Week 3")
///     .model("deepseek-chat")
///     .max_retries(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Name of the output deck. Default: "PDF Flashcards".
    pub deck_name: String,

    /// Chat model identifier. Default: "deepseek-chat".
    pub model: String,

    /// Base URL of the OpenAI-compatible completion API.
    /// Default: `https://api.deepseek.com/v1`.
    pub base_url: String,

    /// API key. If `None`, `DEEPSEEK_API_KEY` is read from the
    /// environment; a missing key is fatal before any processing begins.
    pub api_key: Option<String>,

    /// Pre-constructed completion client. Takes precedence over
    /// `api_key`/`base_url`/`model`; the injection point used by tests.
    pub client: Option<Arc<dyn CompletionClient>>,

    /// Sampling temperature for the completion. Default: 0.7.
    ///
    /// Flashcard generation benefits from some creativity in phrasing the
    /// questions; 0.7 keeps answers faithful while varying the wording.
    pub temperature: f32,

    /// Maximum tokens the model may generate per slide. Default: 8192.
    ///
    /// A dense slide can legitimately yield five long answers. Setting
    /// this too low truncates the JSON array mid-object and pushes the
    /// response into the lossy stages of the recovery chain.
    pub max_tokens: usize,

    /// API attempts per slide. Default: 3.
    ///
    /// A slide is never fatal: after the last attempt it degrades to the
    /// synthetic fallback card.
    pub max_retries: u32,

    /// Fixed pause between failed attempts, in milliseconds. Default: 1000.
    ///
    /// Deliberately a flat pause, not exponential backoff: slides are
    /// processed one at a time, so there is no herd to thunder.
    pub retry_pause_ms: u64,

    /// Custom system prompt. If `None`, uses
    /// [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Anki deck identifier. If `None`, a fresh random id in
    /// `[2^30, 2^31)` is drawn at packaging time. Inject a fixed value
    /// for reproducible packages (and tests).
    pub deck_id: Option<i64>,

    /// Anki note-model identifier. Same semantics as `deck_id`.
    pub model_id: Option<i64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-API-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional per-slide progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            deck_name: "PDF Flashcards".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key: None,
            client: None,
            temperature: 0.7,
            max_tokens: 8192,
            max_retries: 3,
            retry_pause_ms: 1000,
            system_prompt: None,
            deck_id: None,
            model_id: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("deck_name", &self.deck_name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_pause_ms", &self.retry_pause_ms)
            .field("deck_id", &self.deck_id)
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn deck_name(mut self, name: impl Into<String>) -> Self {
        self.config.deck_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_pause_ms(mut self, ms: u64) -> Self {
        self.config.retry_pause_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn deck_id(mut self, id: i64) -> Self {
        self.config.deck_id = Some(id);
        self
    }

    pub fn model_id(mut self, id: i64) -> Self {
        self.config.model_id = Some(id);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2AnkiError> {
        let c = &self.config;
        if c.deck_name.trim().is_empty() {
            return Err(Pdf2AnkiError::InvalidConfig(
                "Deck name must not be empty".into(),
            ));
        }
        if c.max_retries == 0 {
            return Err(Pdf2AnkiError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2AnkiError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
