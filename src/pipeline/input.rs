//! Upload validation: decide whether a byte buffer plus filename can enter the
//! pipeline, and which extractor it goes to.
//!
//! Checks run in a fixed order (size, then extension, then emptiness) so the
//! caller always sees the first problem a user would care about. An oversized
//! file with a bad extension reports its size.

use crate::error::DocTranslateError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Every supported format, in display order.
    pub const ALL: [DocumentFormat; 3] = [DocumentFormat::Pdf, DocumentFormat::Docx, DocumentFormat::Txt];

    /// Parse an extension with or without the leading dot, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" => Some(DocumentFormat::Txt),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::from_extension(&extension_of(filename))
    }

    /// The extension with its leading dot, e.g. `.docx`.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => ".pdf",
            DocumentFormat::Docx => ".docx",
            DocumentFormat::Txt => ".txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Summary of an upload as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// Lower-cased extension with its dot; empty if the name has none.
    pub extension: String,
    pub size: u64,
    /// Size in MiB rounded to two decimals.
    pub size_mb: f64,
    pub is_supported: bool,
}

/// Lower-cased extension of `filename` including the dot, or `""`.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

pub fn file_info(filename: &str, size: u64) -> FileInfo {
    let extension = extension_of(filename);
    FileInfo {
        name: filename.to_string(),
        is_supported: DocumentFormat::from_extension(&extension).is_some(),
        extension,
        size,
        size_mb: round2(size as f64 / (1024.0 * 1024.0)),
    }
}

/// Validate an upload and return its format.
///
/// # Errors
/// * [`DocTranslateError::FileTooLarge`] when `bytes.len() > max_size`
/// * [`DocTranslateError::UnsupportedFormat`] for anything but `.pdf`, `.docx`, `.txt`
/// * [`DocTranslateError::EmptyFile`] for a zero-length upload
pub fn validate_file(
    bytes: &[u8],
    filename: &str,
    max_size: u64,
) -> Result<(DocumentFormat, FileInfo), DocTranslateError> {
    let info = file_info(filename, bytes.len() as u64);

    if info.size > max_size {
        return Err(DocTranslateError::FileTooLarge {
            size_mb: info.size as f64 / (1024.0 * 1024.0),
            max_mb: max_size as f64 / (1024.0 * 1024.0),
        });
    }

    let format = DocumentFormat::from_extension(&info.extension).ok_or_else(|| {
        DocTranslateError::UnsupportedFormat {
            extension: info.extension.clone(),
        }
    })?;

    if bytes.is_empty() {
        return Err(DocTranslateError::EmptyFile);
    }

    debug!("Validated upload {} ({}, {})", filename, format, format_file_size(info.size));
    Ok((format, info))
}

/// Human-readable size: `0B`, `512.0 B`, `1.5 KB`, `16.0 MB`, `2.0 GB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Keep the first `max_chars` characters and append `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Replace characters that are invalid in file names on common platforms.
pub fn clean_filename(filename: &str) -> String {
    UNSAFE_FILENAME_CHARS
        .replace_all(filename, "_")
        .trim()
        .to_string()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
