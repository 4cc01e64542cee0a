//! CLI binary for doctranslate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TranslationConfig`, runs one document and prints or writes the result.

use anyhow::{bail, Context, Result};
use clap::Parser;
use doctranslate::languages::SUPPORTED_LANGUAGES;
use doctranslate::pipeline::input::format_file_size;
use doctranslate::{
    render_text, write_output, BackendKind, DetectionReport, DocumentTranslator, ExtractionReport,
    ProgressCallback, TranslateRequest, TranslationConfig, TranslationProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar over chunks. A failed backend resets the bar because the next
/// backend starts again from chunk 1.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.set_message("reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl CliProgressCallback {
    /// Stop the spinner without printing a result line.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_translation_start(&self, total_chunks: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} chunks  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_style(style);
        self.bar.set_length(total_chunks as u64);
        self.bar.set_prefix("Translating");
    }

    fn on_backend_start(&self, backend: BackendKind, attempt: usize) {
        self.bar.set_position(0);
        self.bar.set_message(format!("{backend} (attempt {attempt})"));
    }

    fn on_chunk_complete(&self, _backend: BackendKind, chunk: usize, _total_chunks: usize) {
        self.bar.set_position(chunk as u64);
    }

    fn on_backend_failed(&self, backend: BackendKind, chunk: usize, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<10} chunk {:>3}  {}",
            red("✗"),
            backend.as_str(),
            chunk,
            red(&msg)
        ));
    }

    fn on_translation_complete(&self, backend: Option<BackendKind>, success: bool) {
        self.bar.finish_and_clear();
        match (success, backend) {
            (true, Some(b)) => eprintln!("{} translated with {}", green("✔"), bold(b.as_str())),
            (true, None) => eprintln!("{} no translation needed", green("✔")),
            (false, _) => eprintln!("{} all translation backends failed", red("✘")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate a PDF to Hindi, print the text
  doctranslate report.pdf --target hi

  # Write a PDF report of the translation
  doctranslate notes.docx -t mr -o notes_mr.pdf

  # Prefer LibreTranslate on a self-hosted instance
  doctranslate letter.txt -b libre --libre-url http://localhost:5000

  # Only detect the document language
  doctranslate --detect-only letter.txt

  # Structured output
  doctranslate --json report.pdf -t en > result.json

BACKENDS (failover order after the preferred one: google, libre, mymemory):
  google      free endpoint, no key
  microsoft   Azure Translator, needs --microsoft-api-key
  libre       LibreTranslate, optional --libre-api-key
  mymemory    free, optional --mymemory-email for higher quota

ENVIRONMENT VARIABLES:
  DOCTRANSLATE_TARGET / _SOURCE / _BACKEND   request defaults
  LIBRE_URL, LIBRE_API_KEY                   LibreTranslate instance
  MICROSOFT_TRANSLATOR_KEY / _REGION         Azure Translator credentials
  MYMEMORY_EMAIL                             MyMemory contact address
  PDFIUM_LIB_PATH                            libpdfium file or directory
  RUST_LOG                                   overrides -v / -q
"#;

/// Translate PDF, DOCX and text documents.
#[derive(Parser, Debug)]
#[command(
    name = "doctranslate",
    version,
    about = "Translate PDF, DOCX and text documents with automatic backend failover",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to translate (.pdf, .docx or .txt).
    #[arg(required_unless_present = "list_languages")]
    input: Option<PathBuf>,

    /// Write the result here instead of stdout. A `.pdf` path writes a PDF report.
    #[arg(short, long, env = "DOCTRANSLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Target language code.
    #[arg(short, long, env = "DOCTRANSLATE_TARGET", default_value = "en")]
    target: String,

    /// Source language code, or `auto` to detect it.
    #[arg(short, long, env = "DOCTRANSLATE_SOURCE", default_value = "auto")]
    source: String,

    /// Preferred backend: google, microsoft, libre, mymemory.
    #[arg(short, long, env = "DOCTRANSLATE_BACKEND", default_value = "google")]
    backend: BackendKind,

    /// Maximum characters per translation request.
    #[arg(long, env = "DOCTRANSLATE_CHUNK_SIZE", default_value_t = 5000)]
    chunk_size: usize,

    /// Delay between chunks in milliseconds.
    #[arg(long, env = "DOCTRANSLATE_CHUNK_DELAY_MS", default_value_t = 100)]
    chunk_delay_ms: u64,

    /// Upload size limit in MiB.
    #[arg(long, env = "DOCTRANSLATE_MAX_FILE_MB", default_value_t = 16)]
    max_file_mb: u64,

    /// Write a PDF report even when the output path is not `.pdf`.
    #[arg(long)]
    pdf: bool,

    /// TrueType font for the PDF report (needed for non-Latin scripts).
    #[arg(long, env = "DOCTRANSLATE_PDF_FONT")]
    font: Option<PathBuf>,

    /// Append one line per request to this file.
    #[arg(long, env = "DOCTRANSLATE_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// LibreTranslate base URL.
    #[arg(long, env = "LIBRE_URL")]
    libre_url: Option<String>,

    #[arg(long, env = "LIBRE_API_KEY", hide_env_values = true)]
    libre_api_key: Option<String>,

    #[arg(long, env = "MICROSOFT_TRANSLATOR_KEY", hide_env_values = true)]
    microsoft_api_key: Option<String>,

    #[arg(long, env = "MICROSOFT_TRANSLATOR_REGION")]
    microsoft_region: Option<String>,

    #[arg(long, env = "MYMEMORY_EMAIL")]
    mymemory_email: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "DOCTRANSLATE_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Only detect the document's language.
    #[arg(long, conflicts_with = "extract_only")]
    detect_only: bool,

    /// Only extract the document's text.
    #[arg(long)]
    extract_only: bool,

    /// List languages with display names and exit.
    #[arg(long)]
    list_languages: bool,

    /// Print structured JSON instead of plain text.
    #[arg(long, env = "DOCTRANSLATE_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DOCTRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCTRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCTRANSLATE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.detect_only && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    if cli.list_languages {
        return list_languages(cli.json);
    }
    let Some(input) = cli.input.as_deref() else {
        bail!("no input document given");
    };

    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress = cli_progress.clone().map(|cb| cb as ProgressCallback);

    let result = run(&cli, input, progress).await;
    if result.is_err() {
        // Failures before translation never reach `on_translation_complete`.
        if let Some(cb) = &cli_progress {
            cb.abandon();
        }
    }
    result
}

async fn run(cli: &Cli, input: &Path, progress: Option<ProgressCallback>) -> Result<()> {
    let config = build_config(cli, progress)?;
    let translator = DocumentTranslator::new(config);

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    // ── Extract / detect only ────────────────────────────────────────────
    if cli.extract_only || cli.detect_only {
        let (info, extracted) = translator
            .extract(&bytes, &filename)
            .await
            .context("Extraction failed")?;

        if cli.detect_only {
            let detection = translator.orchestrator().detector().detect(&extracted.text);
            let report = DetectionReport::from(&detection);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialise detection")?);
            } else {
                println!("File:        {} ({})", info.name, format_file_size(info.size));
                println!("Language:    {}", report.language);
                println!("Confidence:  {:.2}", report.confidence);
            }
        } else if cli.json {
            let result: Result<_, doctranslate::ExtractionError> = Ok(extracted);
            let report = ExtractionReport::from(&result);
            println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialise extraction")?);
        } else {
            print_text(&extracted.text)?;
        }
        return Ok(());
    }

    // ── Translate ────────────────────────────────────────────────────────
    let started = Instant::now();
    let request = TranslateRequest::new(&cli.target)
        .source(&cli.source)
        .backend(cli.backend)
        .chunk_size(cli.chunk_size);
    let doc = translator
        .translate_document(&bytes, &filename, &request)
        .await
        .context("Translation failed")?;

    if let Some(ref output_path) = cli.output {
        let as_pdf = cli.pdf || has_pdf_extension(output_path);
        let artifact = if as_pdf {
            translator.render_pdf(&doc)
        } else {
            render_text(&doc.translation.translated_text)
        };
        write_output(output_path, &artifact)
            .await
            .context("Failed to write output")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} → {}  {} chunks  {}ms  →  {}",
                green("✔"),
                doc.translation.source_language,
                doc.translation.target_language,
                doc.translation.chunks_processed,
                started.elapsed().as_millis(),
                bold(&output_path.display().to_string()),
            );
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&doc).context("Failed to serialise output")?);
    } else if cli.output.is_none() {
        print_text(&doc.translation.translated_text)?;
        if !cli.quiet {
            if let Some(note) = &doc.translation.note {
                eprintln!("{}", dim(note));
            }
        }
    }

    Ok(())
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .target_lang(&cli.target)
        .source_lang(&cli.source)
        .backend(cli.backend)
        .chunk_size(cli.chunk_size)
        .chunk_delay_ms(cli.chunk_delay_ms)
        .max_file_size(cli.max_file_mb.saturating_mul(1024 * 1024))
        .request_timeout_secs(cli.timeout);

    if let Some(ref path) = cli.font {
        builder = builder.pdf_font_path(path);
    }
    if let Some(ref path) = cli.log_file {
        builder = builder.log_file(path);
    }
    if let Some(ref url) = cli.libre_url {
        builder = builder.libre_url(url);
    }
    if let Some(ref key) = cli.libre_api_key {
        builder = builder.libre_api_key(key);
    }
    if let Some(ref key) = cli.microsoft_api_key {
        builder = builder.microsoft_api_key(key);
    }
    if let Some(ref region) = cli.microsoft_region {
        builder = builder.microsoft_region(region);
    }
    if let Some(ref email) = cli.mymemory_email {
        builder = builder.mymemory_email(email);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn list_languages(json: bool) -> Result<()> {
    if json {
        let map: serde_json::Map<String, serde_json::Value> = SUPPORTED_LANGUAGES
            .iter()
            .map(|(code, name)| (code.to_string(), serde_json::Value::from(*name)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map).context("Failed to serialise languages")?);
    } else {
        for (code, name) in SUPPORTED_LANGUAGES {
            println!("{code:<4} {name}");
        }
    }
    Ok(())
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn print_text(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
