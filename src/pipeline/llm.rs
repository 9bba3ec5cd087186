//! LLM interaction: build chat messages, call the completion endpoint,
//! and orchestrate the per-slide retry loop.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] and all response salvage in
//! [`crate::pipeline::recover`], so either can change without touching
//! retry or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! A fixed `retry_pause_ms` (default 1 s) between failed attempts, no
//! exponential backoff: slides are processed one at a time, so there is
//! no concurrent herd, and the failures worth retrying (transient 5xx,
//! network blips) recover within a second or not at all. A slide whose
//! attempts are all exhausted degrades to a synthetic fallback card and
//! the run continues.

use crate::config::ConversionConfig;
use crate::error::{Pdf2AnkiError, SlideError};
use crate::output::{Card, Slide};
use crate::pipeline::recover;
use crate::prompts::{self, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Context string stamped on cards produced by the fallback path.
pub const FALLBACK_CONTEXT: &str = "Auto-generated (API request failed)";

/// Answer used by the fallback card when the slide content is empty.
pub const FALLBACK_ANSWER: &str = "Review the slide content.";

/// One role-tagged chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Generation parameters forwarded with every request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A synchronous-in-spirit chat completion endpoint: one message list in,
/// one text response out.
///
/// The production implementation is [`DeepSeekClient`]; tests inject
/// their own via [`crate::config::ConversionConfig::client`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, Pdf2AnkiError>;
}

// ── DeepSeek / OpenAI-compatible client ─────────────────────────────────

/// Client for the DeepSeek chat completion API (or any OpenAI-compatible
/// endpoint — the wire format is identical).
pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepSeekClient {
    /// Build a client. `base_url` is the API root without the
    /// `/chat/completions` suffix, e.g. `https://api.deepseek.com/v1`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, Pdf2AnkiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Pdf2AnkiError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, messages: &[ChatMessage], options: &CompletionOptions) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "stream": false,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for DeepSeekClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, Pdf2AnkiError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages, options))
            .send()
            .await
            .map_err(|e| Pdf2AnkiError::LlmApiError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Pdf2AnkiError::LlmApiError {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| Pdf2AnkiError::LlmApiError {
                    message: format!("malformed completion response: {e}"),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Pdf2AnkiError::LlmApiError {
                message: "completion response contained no choices".to_string(),
            })
    }
}

// ── Per-slide orchestration ─────────────────────────────────────────────

/// Outcome of card generation for one slide that passed the gate.
#[derive(Debug)]
pub struct SlideOutcome {
    /// Cards to append, already stamped with slide label and context.
    pub cards: Vec<Card>,
    /// Failed attempts before the first success (equals `max_retries`
    /// when the fallback path was taken).
    pub retries: u32,
    /// True when the cards came from the fallback path.
    pub fallback: bool,
    /// Set when all attempts failed.
    pub error: Option<SlideError>,
}

/// Generate cards for one cleaned slide.
///
/// Attempts up to `config.max_retries` API calls with a fixed pause
/// between failures. The recovery chain guarantees a successful call
/// yields at least one pair, so the only failure mode here is the client
/// itself erroring. After the last failure, synthesizes exactly one
/// fallback card — provided the title is non-empty, which the
/// meaningful-content gate does not guarantee on its own.
pub async fn generate_cards(
    client: &Arc<dyn CompletionClient>,
    slide: &Slide,
    config: &ConversionConfig,
) -> SlideOutcome {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let slide_text = prompts::slide_text(&slide.title, &slide.content);
    let messages = [
        ChatMessage::system(system_prompt),
        ChatMessage::user(prompts::card_prompt(&slide_text)),
    ];
    let options = CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let mut last_err: Option<String> = None;

    for attempt in 0..config.max_retries {
        if attempt > 0 {
            sleep(Duration::from_millis(config.retry_pause_ms)).await;
        }

        match client.chat(&messages, &options).await {
            Ok(response) => {
                let pairs = recover::recover_pairs(&response, &slide_text);
                debug!(
                    "Slide {}: {} cards in {:?} ({} failed attempts)",
                    slide.slide_num,
                    pairs.len(),
                    start.elapsed(),
                    attempt
                );

                let label = slide.label();
                let cards = pairs
                    .into_iter()
                    .map(|p| Card {
                        question: p.question,
                        answer: p.answer,
                        slide: label.clone(),
                        context: slide.title.clone(),
                    })
                    .collect();

                return SlideOutcome {
                    cards,
                    retries: attempt,
                    fallback: false,
                    error: None,
                };
            }
            Err(e) => {
                warn!(
                    "Slide {}: attempt {}/{} failed — {}",
                    slide.slide_num,
                    attempt + 1,
                    config.max_retries,
                    e
                );
                last_err = Some(e.to_string());
            }
        }
    }

    // All attempts exhausted: degrade to the synthetic fallback card.
    let detail = last_err.unwrap_or_else(|| "unknown error".to_string());
    let cards = fallback_card(slide).into_iter().collect();

    SlideOutcome {
        cards,
        retries: config.max_retries,
        fallback: true,
        error: Some(SlideError::GenerationFailed {
            slide: slide.slide_num,
            retries: config.max_retries,
            detail,
        }),
    }
}

/// The single synthetic card emitted when every API attempt failed.
///
/// Requires a non-empty title; without one there is nothing sensible to
/// ask, so no card is emitted and the slide is recorded as failed only.
fn fallback_card(slide: &Slide) -> Option<Card> {
    if slide.title.is_empty() {
        return None;
    }

    Some(Card {
        question: format!("Explain the concept of: {}", slide.title),
        answer: if slide.content.is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            slide.content.clone()
        },
        slide: slide.label(),
        context: FALLBACK_CONTEXT.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    #[async_trait]
    impl CompletionClient for AlwaysFails {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String, Pdf2AnkiError> {
            Err(Pdf2AnkiError::LlmApiError {
                message: "HTTP 503: overloaded".into(),
            })
        }
    }

    struct CannedResponse(&'static str);

    #[async_trait]
    impl CompletionClient for CannedResponse {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String, Pdf2AnkiError> {
            Ok(self.0.to_string())
        }
    }

    fn test_config() -> ConversionConfig {
        ConversionConfig::builder()
            .retry_pause_ms(1)
            .build()
            .unwrap()
    }

    fn slide(title: &str, content: &str, slide_num: usize) -> Slide {
        Slide {
            title: title.into(),
            content: content.into(),
            slide_num,
        }
    }

    #[tokio::test]
    async fn successful_call_stamps_label_and_context() {
        let client: Arc<dyn CompletionClient> = Arc::new(CannedResponse(
            r#"[{"question": "Q1", "answer": "A1"}, {"question": "Q2", "answer": "A2"}]"#,
        ));
        let s = slide("Memory Hierarchy", "L1 and L2 caches", 4);

        let outcome = generate_cards(&client, &s, &test_config()).await;

        assert_eq!(outcome.cards.len(), 2);
        assert_eq!(outcome.retries, 0);
        assert!(!outcome.fallback);
        assert!(outcome.error.is_none());
        for card in &outcome.cards {
            assert_eq!(card.slide, "Slide 4");
            assert_eq!(card.context, "Memory Hierarchy");
        }
    }

    #[tokio::test]
    async fn exhausted_retries_yield_one_fallback_card() {
        let client: Arc<dyn CompletionClient> = Arc::new(AlwaysFails);
        let s = slide("Paging", "Pages map virtual to physical memory", 2);

        let outcome = generate_cards(&client, &s, &test_config()).await;

        assert_eq!(outcome.cards.len(), 1);
        assert_eq!(outcome.retries, 3);
        assert!(outcome.fallback);
        assert!(outcome.error.is_some());

        let card = &outcome.cards[0];
        assert_eq!(card.question, "Explain the concept of: Paging");
        assert_eq!(card.answer, "Pages map virtual to physical memory");
        assert_eq!(card.slide, "Slide 2");
        assert_eq!(card.context, FALLBACK_CONTEXT);
    }

    #[tokio::test]
    async fn fallback_uses_placeholder_answer_for_empty_content() {
        let client: Arc<dyn CompletionClient> = Arc::new(AlwaysFails);
        let s = slide("Scheduling", "", 6);

        let outcome = generate_cards(&client, &s, &test_config()).await;
        assert_eq!(outcome.cards[0].answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn no_fallback_card_without_a_title() {
        let client: Arc<dyn CompletionClient> = Arc::new(AlwaysFails);
        let s = slide("", "content long enough to pass the gate", 8);

        let outcome = generate_cards(&client, &s, &test_config()).await;
        assert!(outcome.cards.is_empty());
        assert!(outcome.fallback);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn garbage_response_still_yields_echo_card() {
        let client: Arc<dyn CompletionClient> = Arc::new(CannedResponse("no json here"));
        let s = slide("Vi Editor", "modal editing", 1);

        let outcome = generate_cards(&client, &s, &test_config()).await;
        assert_eq!(outcome.cards.len(), 1);
        assert_eq!(outcome.cards[0].question, "Review this slide");
        assert!(outcome.cards[0].answer.contains("Vi Editor"));
        assert!(!outcome.fallback);
    }

    #[test]
    fn request_body_shape() {
        let client = DeepSeekClient::new("k", "https://api.deepseek.com/v1", "deepseek-chat", 60)
            .unwrap();
        let body = client.request_body(
            &[ChatMessage::system("s"), ChatMessage::user("u")],
            &CompletionOptions {
                temperature: 0.7,
                max_tokens: 8192,
            },
        );
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "u");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let client =
            DeepSeekClient::new("k", "https://api.deepseek.com/v1/", "deepseek-chat", 60).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }
}
