//! Error types for the doctranslate library.
//!
//! Each pipeline stage owns its error type, and they differ in how far they
//! travel:
//!
//! * [`ExtractionError`] and [`DetectionError`] are returned to the caller,
//!   who decides what to do (abort, or assume a default language).
//!
//! * [`BackendError`] describes one failed call to one translation service.
//!   The orchestrator recovers from it by moving to the next backend in the
//!   failover chain; it only reaches the caller inside
//!   [`TranslationError::AllBackendsFailed`].
//!
//! * [`TranslationError`] is the terminal failure of a translation request.
//!
//! * [`DocTranslateError`] is **fatal** for the document facade in
//!   [`crate::convert`]: the upload is invalid, no text could be extracted, or
//!   translation failed outright.
//!
//! PDF rendering failures never escape [`crate::pipeline::render`]; they are
//! turned into an error document there.

use crate::backends::BackendKind;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the document pipeline.
#[derive(Debug, Error)]
pub enum DocTranslateError {
    // ── Upload validation ─────────────────────────────────────────────────
    /// The upload exceeds the configured size limit.
    #[error("File too large. Maximum size: {max_mb}MB, your file: {size_mb:.2}MB")]
    FileTooLarge { size_mb: f64, max_mb: f64 },

    /// The file extension is not one of `.pdf`, `.docx`, `.txt`.
    #[error("Unsupported file format '{extension}'. Supported: .pdf, .docx, .txt")]
    UnsupportedFormat { extension: String },

    /// The upload has zero bytes.
    #[error("File is empty")]
    EmptyFile,

    // ── Pipeline stages ───────────────────────────────────────────────────
    /// Every extraction strategy for the format failed.
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Extraction succeeded but produced only whitespace.
    #[error("No text found in document '{filename}'")]
    NoTextFound { filename: String },

    /// The translation request failed.
    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
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

/// Text extraction failed for every strategy available to the format.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ExtractionError {
    /// No extractor exists for this extension.
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// Both the pdfium text layer and the pdf-extract parser failed.
    #[error("PDF extraction failed: {detail}")]
    PdfFailed { detail: String },

    /// Both the structured and the raw DOCX readers failed.
    #[error("DOCX extraction failed: {detail}")]
    DocxFailed { detail: String },

    /// The bytes are neither UTF-8 nor any of the fallback encodings.
    #[error("Could not decode text file with any encoding")]
    Undecodable,
}

/// Language detection could not produce a guess.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum DetectionError {
    /// Fewer characters than the detector's minimum remained after cleaning.
    #[error("text too short")]
    TooShort { chars: usize },

    /// The statistical identifier itself failed.
    #[error("Detection failed: {0}")]
    Detector(String),
}

/// One failed call to one translation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum BackendError {
    /// The backend is not present in the registry (e.g. no API key).
    #[error("backend '{backend}' is not configured")]
    NotConfigured { backend: BackendKind },

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// HTTP 429 from the service.
    #[error("rate limit exceeded for '{backend}'")]
    RateLimited { backend: BackendKind },

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

/// A backend that was tried and abandoned during failover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendFailure {
    pub backend: BackendKind,
    /// 1-indexed chunk that failed.
    pub chunk: usize,
    pub error: BackendError,
}

/// Terminal failure of a translation request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum TranslationError {
    /// The input was empty or whitespace only.
    #[error("Empty text provided")]
    EmptyText,

    /// Every candidate in the failover chain failed on some chunk.
    #[error("All translation backends failed")]
    AllBackendsFailed {
        source_lang: String,
        target_lang: String,
        attempts: Vec<BackendFailure>,
    },
}

/// Internal PDF rendering failure; recovered inside the renderer.
#[derive(Debug, Error)]
pub(crate) enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("font could not be loaded from '{path}': {source}")]
    Font {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while writing PDF: {0}")]
    Io(#[from] std::io::Error),
}
