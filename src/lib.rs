//! # doctranslate
//!
//! Translate PDF, DOCX and plain-text documents through free and keyed
//! machine-translation services, with automatic failover between them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Input      size and extension checks
//!  ├─ 2. Extract    pdfium / pdf-extract, DOCX XML, encoding-sniffed text
//!  ├─ 3. Detect     source language when the request says `auto`
//!  ├─ 4. Chunk      word-boundary chunks sized for backend limits
//!  ├─ 5. Translate  google → libre → mymemory until one succeeds
//!  ├─ 6. Render     A4 PDF report or UTF-8 text
//!  └─ 7. Log        one line per request
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doctranslate::{DocumentTranslator, TranslateRequest, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = DocumentTranslator::new(TranslationConfig::default());
//!     let bytes = std::fs::read("report.pdf")?;
//!     let request = TranslateRequest::new("hi").source("auto");
//!     let doc = translator.translate_document(&bytes, "report.pdf", &request).await?;
//!     println!("{}", doc.translation.translated_text);
//!     doctranslate::write_output("report_translated.pdf", &translator.render_pdf(&doc)).await?;
//!     Ok(())
//! }
//! ```
//!
//! Text that is already extracted can go straight to the
//! [`TranslationOrchestrator`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctranslate` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! ## Runtime requirements
//!
//! PDF extraction prefers pdfium. Set `PDFIUM_LIB_PATH` to the library file or
//! its directory; without it the system library is tried, then `pdf-extract`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backends;
pub mod config;
pub mod convert;
pub mod error;
pub mod history;
pub mod languages;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backends::{BackendKind, BackendRegistry, TranslationBackend};
pub use config::{BackendSettings, TranslationConfig, TranslationConfigBuilder};
pub use convert::{write_output, DocumentTranslator};
pub use error::{
    BackendError, BackendFailure, DetectionError, DocTranslateError, ExtractionError, TranslationError,
};
pub use history::{LogEntry, TranslationLog};
pub use output::{
    Detection, DetectionReport, DocumentTranslation, ExtractionReport, Translation, TranslationReport,
};
pub use pipeline::chunk::{chunk_text, Chunk};
pub use pipeline::detect::{LanguageDetector, LanguageIdentifier};
pub use pipeline::extract::{extract, ExtractedText, ExtractionMethod};
pub use pipeline::input::{validate_file, DocumentFormat, FileInfo};
pub use pipeline::langmap::BackendLanguageMap;
pub use pipeline::render::{render_pdf, render_text};
pub use pipeline::translate::{TranslateRequest, TranslationOrchestrator};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
