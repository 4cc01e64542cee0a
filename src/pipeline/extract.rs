//! Text extraction dispatcher: bytes + format → plain text.
//!
//! Every format has a primary strategy and at least one fallback; see
//! [`super::pdf`] and [`super::docx`]. Plain text is decoded as UTF-8 and then,
//! if that fails, with a short list of legacy single-byte encodings.
//!
//! Extraction is synchronous and CPU-bound. [`crate::convert`] runs it inside
//! `tokio::task::spawn_blocking`.

use super::input::DocumentFormat;
use crate::error::ExtractionError;
use encoding_rs::Encoding;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};

/// Legacy encodings tried, in order, when a text file is not UTF-8.
const FALLBACK_ENCODINGS: [&str; 3] = ["latin-1", "windows-1252", "iso-8859-1"];

/// Which strategy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    Pdfium,
    PdfExtract,
    DocxStructured,
    DocxRaw,
    /// UTF-8 text.
    Direct,
    /// Text decoded with the named legacy encoding.
    DirectEncoding(&'static str),
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Pdfium => f.write_str("pdfium"),
            ExtractionMethod::PdfExtract => f.write_str("pdf-extract"),
            ExtractionMethod::DocxStructured => f.write_str("docx-structured"),
            ExtractionMethod::DocxRaw => f.write_str("docx-raw"),
            ExtractionMethod::Direct => f.write_str("direct"),
            ExtractionMethod::DirectEncoding(label) => write!(f, "direct-{label}"),
        }
    }
}

impl Serialize for ExtractionMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Text pulled out of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedText {
    /// Trimmed plain text.
    pub text: String,
    /// Pages (PDF), paragraphs (DOCX) or lines (TXT).
    pub units: usize,
    pub method: ExtractionMethod,
}

impl ExtractedText {
    pub(crate) fn new(text: String, units: usize, method: ExtractionMethod) -> Self {
        Self {
            text: text.trim().to_string(),
            units,
            method,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extract text from `bytes` interpreted as `format`.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<ExtractedText, ExtractionError> {
    debug!("Extracting {} ({} bytes)", format, bytes.len());
    match format {
        DocumentFormat::Pdf => super::pdf::extract_pdf(bytes),
        DocumentFormat::Docx => super::docx::extract_docx(bytes),
        DocumentFormat::Txt => decode_text(bytes),
    }
}

/// Like [`extract`], with the format given as an extension (`.pdf`, `docx`, …).
pub fn extract_with_extension(bytes: &[u8], extension: &str) -> Result<ExtractedText, ExtractionError> {
    let format = DocumentFormat::from_extension(extension).ok_or_else(|| {
        ExtractionError::UnsupportedFormat {
            extension: extension.to_ascii_lowercase(),
        }
    })?;
    extract(bytes, format)
}

fn decode_text(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return Ok(text_result(text, ExtractionMethod::Direct));
    }

    warn!("Text file is not valid UTF-8, trying legacy encodings");
    for label in FALLBACK_ENCODINGS {
        if let Some(text) = decode_legacy(label, bytes) {
            debug!("Decoded text file as {}", label);
            return Ok(text_result(&text, ExtractionMethod::DirectEncoding(label)));
        }
    }

    Err(ExtractionError::Undecodable)
}

/// Decode `bytes` with one legacy encoding, `None` if it does not apply.
///
/// ISO-8859-1 maps every byte to the code point of the same value. WHATWG
/// labels (what `encoding_rs` understands) alias it to windows-1252, which
/// differs in 0x80..=0x9F, so it is decoded here directly.
fn decode_legacy(label: &str, bytes: &[u8]) -> Option<String> {
    match label {
        "latin-1" | "iso-8859-1" => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        _ => {
            let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
                warn!("Unknown text encoding label '{}'", label);
                return None;
            };
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned())
        }
    }
}

fn text_result(text: &str, method: ExtractionMethod) -> ExtractedText {
    ExtractedText::new(text.to_string(), text.lines().count(), method)
}
