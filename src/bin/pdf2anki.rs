//! CLI binary for pdf2anki.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2anki::{
    convert, convert_to_file, default_output_path, inspect, ConversionConfig,
    ConversionProgressCallback, ProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-slide
/// log lines using [indicatif]. Slides are processed strictly in order, so
/// no out-of-order bookkeeping is needed.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-slide wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_conversion_start` (called once extraction has counted slides).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, slide_num: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&slide_num)
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_slides: usize) {
        self.activate_bar(total_slides);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating cards for {total_slides} slides…"))
        ));
    }

    fn on_slide_start(&self, slide_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(slide_num, Instant::now());
        self.bar.set_message(format!("slide {slide_num}"));
    }

    fn on_slide_skipped(&self, slide_num: usize, total: usize) {
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            dim("·"),
            slide_num,
            total,
            dim("skipped (no meaningful content)"),
        ));
        self.bar.inc(1);
    }

    fn on_slide_complete(&self, slide_num: usize, total: usize, cards: usize) {
        let elapsed = self.elapsed_secs(slide_num);
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            slide_num,
            total,
            dim(&format!("{cards} cards")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_slide_fallback(&self, slide_num: usize, total: usize, error: &str) {
        let elapsed = self.elapsed_secs(slide_num);
        let msg = truncate_error(error);

        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}  {}",
            yellow("⚠"),
            slide_num,
            total,
            yellow(&format!("fallback: {msg}")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_slides: usize, card_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} cards from {} slides",
            green("✔"),
            bold(&card_count.to_string()),
            total_slides,
        );
    }
}

/// Truncate very long error messages to keep output tidy.
///
/// Counted in characters, not bytes: API error bodies are arbitrary text
/// and a byte slice could split a multi-byte character.
fn truncate_error(error: &str) -> String {
    if error.chars().count() > 80 {
        let head: String = error.chars().take(79).collect();
        format!("{head}\u{2026}")
    } else {
        error.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (deck written to ~/Downloads/<name>_flashcards.apkg)
  pdf2anki lecture.pdf

  # Explicit output path and deck name
  pdf2anki lecture.pdf -o week3.apkg --deck-name "OS — Week 3"

  # Convert from URL
  pdf2anki https://example.com/slides/intro.pdf

  # Preview extracted slides without calling the API (no key needed)
  pdf2anki --inspect-only lecture.pdf

  # Structured JSON output (cards + per-slide results), no .apkg
  pdf2anki --json lecture.pdf > cards.json

  # Point at any OpenAI-compatible endpoint
  pdf2anki --base-url http://localhost:11434/v1 --model llama3 lecture.pdf

ENVIRONMENT VARIABLES:
  DEEPSEEK_API_KEY   API key (also read from a .env file in the working dir)
  PDF2ANKI_MODEL     Override model ID
  PDF2ANKI_BASE_URL  Override API base URL

SETUP:
  1. Set API key:  export DEEPSEEK_API_KEY=sk-...
  2. Convert:      pdf2anki lecture.pdf
  3. Import the .apkg into Anki (File → Import).
"#;

/// Convert PDF slide decks into Anki flashcard packages.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2anki",
    version,
    about = "Convert PDF slide decks into Anki flashcard packages using an LLM",
    long_about = "Convert PDF presentations (local files or URLs) into ready-to-import Anki \
.apkg decks. Each slide's text is extracted, cleaned of boilerplate headers, and turned into \
1-5 question/answer cards by a DeepSeek (or any OpenAI-compatible) chat model.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the .apkg to this path instead of ~/Downloads.
    #[arg(short, long, env = "PDF2ANKI_OUTPUT")]
    output: Option<PathBuf>,

    /// Name of the generated Anki deck.
    #[arg(long, env = "PDF2ANKI_DECK_NAME", default_value = "PDF Flashcards")]
    deck_name: String,

    /// Chat model ID.
    #[arg(long, env = "PDF2ANKI_MODEL", default_value = "deepseek-chat")]
    model: String,

    /// API base URL (any OpenAI-compatible endpoint).
    #[arg(
        long,
        env = "PDF2ANKI_BASE_URL",
        default_value = "https://api.deepseek.com/v1"
    )]
    base_url: String,

    /// API key; falls back to the DEEPSEEK_API_KEY environment variable.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2ANKI_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per slide.
    #[arg(long, env = "PDF2ANKI_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2ANKI_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// API attempts per slide before degrading to a fallback card.
    #[arg(long, env = "PDF2ANKI_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Pause between failed attempts, in milliseconds.
    #[arg(long, env = "PDF2ANKI_RETRY_PAUSE_MS", default_value_t = 1000)]
    retry_pause_ms: u64,

    /// Output structured JSON (cards + per-slide results) instead of an .apkg.
    #[arg(long, env = "PDF2ANKI_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2ANKI_NO_PROGRESS")]
    no_progress: bool,

    /// Print extracted slides only, no card generation (no API key needed).
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2ANKI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2ANKI_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2ANKI_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-slide LLM call timeout in seconds.
    #[arg(long, env = "PDF2ANKI_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up DEEPSEEK_API_KEY and friends from a local .env, if any.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let inspect_config = ConversionConfig::builder()
            .download_timeout_secs(cli.download_timeout)
            .build()
            .context("Invalid configuration")?;
        let slides = inspect(&cli.input, &inspect_config)
            .await
            .context("Failed to extract slides")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&slides).context("Failed to serialize slides")?
            );
        } else {
            println!("File:    {}", cli.input);
            println!("Slides:  {}", slides.len());
            for slide in &slides {
                let gate = if slide.has_meaningful_content() {
                    ""
                } else {
                    "  (would be skipped)"
                };
                println!();
                println!("{} {}{}", bold(&slide.label()), slide.title, gate);
                if !slide.content.is_empty() {
                    for line in slide.content.lines() {
                        println!("    {line}");
                    }
                }
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    // The progress bar is initialised with a spinner (no slide count yet);
    // `on_conversion_start` resizes it to the correct total once the PDF
    // has been extracted.

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    if cli.json {
        let output = convert(&cli.input, &config)
            .await
            .context("Conversion failed")?;
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let stats = convert_to_file(&cli.input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    // Summary line (callback already printed the per-slide log).
    if !cli.quiet {
        eprintln!(
            "{}  {} cards  {}/{} slides  {}ms  →  {}",
            if stats.fallback_slides == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&stats.total_cards.to_string()),
            stats.processed_slides,
            stats.total_slides,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        if stats.fallback_slides > 0 {
            eprintln!(
                "   {} slides degraded to fallback cards",
                red(&stats.fallback_slides.to_string())
            );
        }
        if stats.skipped_slides > 0 {
            eprintln!(
                "   {} slides skipped (no meaningful content)",
                dim(&stats.skipped_slides.to_string())
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .deck_name(&cli.deck_name)
        .model(&cli.model)
        .base_url(&cli.base_url)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .retry_pause_ms(cli.retry_pause_ms)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_error_passes_through() {
        assert_eq!(truncate_error("HTTP 503: overloaded"), "HTTP 503: overloaded");
    }

    #[test]
    fn long_error_is_truncated_with_ellipsis() {
        let long = "x".repeat(120);
        let msg = truncate_error(&long);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with('\u{2026}'));
    }

    #[test]
    fn multibyte_error_truncates_on_char_boundary() {
        // An arrow straddles the old byte-79 cut point; truncation must not
        // panic and must keep whole characters.
        let error = format!("{}→→→", "x".repeat(78));
        let msg = truncate_error(&error);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with("→\u{2026}"));
    }
}
