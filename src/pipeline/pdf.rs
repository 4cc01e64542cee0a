//! PDF text extraction.
//!
//! The pdfium text layer is tried first because it copes best with complex
//! layouts. pdfium is a shared library bound at runtime, so it may simply be
//! absent; in that case (and on any pdfium error) the pure-Rust `pdf-extract`
//! parser takes over. `pdf-extract` panics on some malformed files, so it runs
//! under `catch_unwind`.

use super::extract::{ExtractedText, ExtractionMethod};
use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Extract the text of every page, pages separated by a blank line.
pub(crate) fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let primary = match extract_with_pdfium(bytes) {
        Ok(pages) => {
            info!("PDF text extracted with pdfium: {} pages", pages.len());
            return Ok(ExtractedText::new(join_pages(&pages), pages.len(), ExtractionMethod::Pdfium));
        }
        Err(e) => e,
    };

    warn!("pdfium extraction failed, trying pdf-extract: {}", primary);

    match extract_with_pdf_extract(bytes) {
        Ok(pages) => {
            info!("PDF text extracted with pdf-extract: {} pages", pages.len());
            Ok(ExtractedText::new(join_pages(&pages), pages.len(), ExtractionMethod::PdfExtract))
        }
        Err(fallback) => Err(ExtractionError::PdfFailed {
            detail: format!("pdfium: {primary}; pdf-extract: {fallback}"),
        }),
    }
}

fn join_pages(pages: &[String]) -> String {
    pages.join("\n\n").trim().to_string()
}

// ── pdfium ───────────────────────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, String> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let mut path = PathBuf::from(&p);
            if path.is_dir() {
                path = Pdfium::pdfium_platform_library_name_at_path(&path);
            }
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("pdfium library unavailable: {e:?}"))?;

    Ok(Pdfium::new(bindings))
}

fn extract_with_pdfium(bytes: &[u8]) -> Result<Vec<String>, String> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| format!("{e:?}"))?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| format!("page {}: {e:?}", idx + 1))?
            .all();
        pages.push(text);
    }
    Ok(pages)
}

// ── pdf-extract ──────────────────────────────────────────────────────────

fn extract_with_pdf_extract(bytes: &[u8]) -> Result<Vec<String>, String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    let text = match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(e.to_string()),
        Err(_) => return Err("parser panicked on malformed input".to_string()),
    };

    // pdf-extract ends every page with a form feed.
    let mut pages: Vec<String> = text.split('\x0C').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    Ok(pages)
}
