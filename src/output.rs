//! Result types returned by the pipeline, plus flat reports for callers that
//! want one record with every field filled in.
//!
//! The library returns `Result<T, E>`; a successful value never carries an
//! error and a failure never carries half a translation. The `*Report` types
//! collapse either outcome into a single serialisable record with safe
//! defaults, which is what the CLI's `--json` output prints.

use crate::backends::BackendKind;
use crate::error::{DetectionError, ExtractionError, TranslationError};
use crate::pipeline::extract::ExtractedText;
use crate::pipeline::input::FileInfo;
use serde::Serialize;

/// Note attached when source and target are the same language.
pub const SAME_LANGUAGE_NOTE: &str = "No translation needed - same language";

/// A detected language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// ISO 639-1 code where one exists.
    pub language: String,
    /// Probability in `[0, 1]`, rounded to two decimals.
    pub confidence: f64,
}

/// A completed translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub translated_text: String,
    /// The resolved source language (never `auto`).
    pub source_language: String,
    pub target_language: String,
    /// `None` when no backend was needed.
    pub backend_used: Option<BackendKind>,
    pub chunks_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything the document facade produced for one upload.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTranslation {
    pub file: FileInfo,
    pub extraction: ExtractedText,
    /// Present when the source language was detected rather than given.
    pub detection: Option<Detection>,
    pub translation: Translation,
}

// ── Flat reports ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub text: String,
    pub units: usize,
    pub method: String,
    pub error: Option<String>,
}

impl From<&Result<ExtractedText, ExtractionError>> for ExtractionReport {
    fn from(result: &Result<ExtractedText, ExtractionError>) -> Self {
        match result {
            Ok(x) => Self {
                text: x.text.clone(),
                units: x.units,
                method: x.method.to_string(),
                error: None,
            },
            Err(e) => Self {
                text: String::new(),
                units: 0,
                method: "none".to_string(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub language: String,
    pub confidence: f64,
    pub error: Option<String>,
}

impl From<&Result<Detection, DetectionError>> for DetectionReport {
    fn from(result: &Result<Detection, DetectionError>) -> Self {
        match result {
            Ok(d) => Self {
                language: d.language.clone(),
                confidence: d.confidence,
                error: None,
            },
            Err(e) => Self {
                language: "unknown".to_string(),
                confidence: 0.0,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationReport {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub backend_used: Option<BackendKind>,
    pub chunks_processed: usize,
    pub note: Option<String>,
    pub error: Option<String>,
}

impl TranslationReport {
    /// Flatten a translation outcome. `source` and `target` are the request's
    /// languages, used when the failure happened before they were resolved.
    pub fn from_result(result: &Result<Translation, TranslationError>, source: &str, target: &str) -> Self {
        match result {
            Ok(t) => Self {
                translated_text: t.translated_text.clone(),
                source_language: t.source_language.clone(),
                target_language: t.target_language.clone(),
                backend_used: t.backend_used,
                chunks_processed: t.chunks_processed,
                note: t.note.clone(),
                error: None,
            },
            Err(e) => {
                let (source, target) = match e {
                    TranslationError::AllBackendsFailed {
                        source_lang,
                        target_lang,
                        ..
                    } => (source_lang.as_str(), target_lang.as_str()),
                    TranslationError::EmptyText => (source, target),
                };
                Self {
                    translated_text: String::new(),
                    source_language: source.to_string(),
                    target_language: target.to_string(),
                    backend_used: None,
                    chunks_processed: 0,
                    note: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
