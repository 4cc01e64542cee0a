//! Result rendering: translated text → downloadable artifacts.
//!
//! Plain text is returned verbatim as UTF-8. The PDF rendering is a simple
//! paginated A4 report: a bold title, two italic metadata lines, then the
//! body at 12 pt, long lines wrapped at 80 characters.
//!
//! [`render_pdf`] never fails. If the report cannot be produced, a one-page
//! error document is returned instead, and if even that fails, a minimal
//! hand-assembled PDF.
//!
//! ## Fonts
//!
//! The default is the built-in Helvetica, which only covers Latin-1; other
//! characters are replaced by `?`. Set [`RenderOptions::font_path`] to a
//! TrueType font (e.g. Noto Sans Devanagari) to render Hindi, Marathi or
//! Sanskrit output.

use crate::error::RenderError;
use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{debug, error, warn};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;

/// Lines longer than this are word-wrapped.
pub const WRAP_COLUMNS: usize = 80;

/// Options for [`render_pdf_with`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// TrueType font used for every line. None = built-in Helvetica.
    pub font_path: Option<PathBuf>,
    /// Timestamp printed in the header. None = now.
    pub generated_at: Option<DateTime<Local>>,
}

/// One body row of the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderLine {
    Text(String),
    /// Vertical space for a blank input line.
    Gap,
}

/// The translated text as UTF-8 bytes.
pub fn render_text(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Render `text` as a PDF report with the default options.
pub fn render_pdf(original_filename: &str, text: &str, source: &str, target: &str) -> Vec<u8> {
    render_pdf_with(&RenderOptions::default(), original_filename, text, source, target)
}

/// Render `text` as a PDF report. Never fails and never returns an empty buffer.
pub fn render_pdf_with(
    options: &RenderOptions,
    original_filename: &str,
    text: &str,
    source: &str,
    target: &str,
) -> Vec<u8> {
    match build_report(options, original_filename, text, source, target) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error creating PDF: {}", e);
            error_pdf(&e.to_string())
        }
    }
}

/// Split text into rows the way the report lays them out.
pub fn wrap_lines(text: &str) -> Vec<RenderLine> {
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            rows.push(RenderLine::Gap);
            continue;
        }
        if line.chars().count() <= WRAP_COLUMNS {
            rows.push(RenderLine::Text(line.to_string()));
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        for word in line.split(' ') {
            let word_len = word.chars().count();
            if current_len + word_len + 1 > WRAP_COLUMNS {
                if !current.trim().is_empty() {
                    rows.push(RenderLine::Text(current.trim().to_string()));
                }
                current.clear();
                current_len = 0;
            }
            current.push_str(word);
            current.push(' ');
            current_len += word_len + 1;
        }
        if !current.trim().is_empty() {
            rows.push(RenderLine::Text(current.trim().to_string()));
        }
    }
    rows
}

// ── Report ───────────────────────────────────────────────────────────────

struct Fonts {
    title: IndirectFontRef,
    meta: IndirectFontRef,
    body: IndirectFontRef,
    /// Built-in fonts only encode Latin-1.
    latin1_only: bool,
}

fn load_fonts(doc: &PdfDocumentReference, font_path: Option<&PathBuf>) -> Result<Fonts, RenderError> {
    match font_path {
        Some(path) => {
            let file = File::open(path).map_err(|source| RenderError::Font {
                path: path.clone(),
                source,
            })?;
            let font = doc
                .add_external_font(file)
                .map_err(|e| RenderError::Pdf(format!("{e:?}")))?;
            Ok(Fonts {
                title: font.clone(),
                meta: font.clone(),
                body: font,
                latin1_only: false,
            })
        }
        None => {
            let builtin = |f: BuiltinFont| doc.add_builtin_font(f).map_err(|e| RenderError::Pdf(format!("{e:?}")));
            Ok(Fonts {
                title: builtin(BuiltinFont::HelveticaBold)?,
                meta: builtin(BuiltinFont::HelveticaOblique)?,
                body: builtin(BuiltinFont::Helvetica)?,
                latin1_only: true,
            })
        }
    }
}

/// Top-down cursor over A4 pages.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    /// Distance from the top edge in mm.
    cursor: f32,
    pages: usize,
    latin1_only: bool,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference, latin1_only: bool) -> Self {
        Self {
            doc,
            layer,
            cursor: MARGIN,
            pages: 1,
            latin1_only,
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if self.cursor + height > PAGE_H - BOTTOM_MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Layer {}", self.pages + 1));
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor = MARGIN;
            self.pages += 1;
        }
    }

    /// Write one row of `height` mm, vertically centred like a table cell.
    fn cell(&mut self, text: &str, size_pt: f32, height: f32, font: &IndirectFontRef, centred: bool) {
        self.ensure_room(height);
        let text = self.sanitize(text);
        let baseline = self.cursor + (height + size_pt * PT_TO_MM * 0.7) / 2.0;
        let x = if centred {
            // Helvetica averages roughly half an em per glyph.
            let width = text.chars().count() as f32 * size_pt * 0.5 * PT_TO_MM;
            ((PAGE_W - width) / 2.0).max(MARGIN)
        } else {
            MARGIN
        };
        if !text.is_empty() {
            self.layer.use_text(text, size_pt, Mm(x), Mm(PAGE_H - baseline), font);
        }
        self.cursor += height;
    }

    fn gap(&mut self, height: f32) {
        self.cursor += height;
    }

    fn sanitize(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\t' => ' ',
                c if c.is_control() => ' ',
                c if self.latin1_only && (c as u32) > 0xFF => '?',
                c => c,
            })
            .collect()
    }
}

fn build_report(
    options: &RenderOptions,
    original_filename: &str,
    text: &str,
    source: &str,
    target: &str,
) -> Result<Vec<u8>, RenderError> {
    let title = format!("Translation: {original_filename}");
    let (doc, page, layer) = PdfDocument::new(title.as_str(), Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = load_fonts(&doc, options.font_path.as_ref())?;
    let generated = options.generated_at.unwrap_or_else(Local::now);

    let rows = wrap_lines(text);
    let pages = {
        let mut w = PageWriter::new(&doc, doc.get_page(page).get_layer(layer), fonts.latin1_only);

        w.cell(&title, 16.0, 10.0, &fonts.title, true);
        w.gap(5.0);
        w.cell(&format!("Translated from {source} to {target}"), 10.0, 5.0, &fonts.meta, false);
        w.cell(
            &format!("Generated on: {}", generated.format("%Y-%m-%d %H:%M:%S")),
            10.0,
            5.0,
            &fonts.meta,
            false,
        );
        w.gap(10.0);

        for row in &rows {
            match row {
                RenderLine::Text(line) => w.cell(line, 12.0, 6.0, &fonts.body, false),
                RenderLine::Gap => w.gap(3.0),
            }
        }
        w.pages
    };

    debug!("PDF report: {} rows on {} page(s)", rows.len(), pages);
    save(doc)
}

fn save(doc: PdfDocumentReference) -> Result<Vec<u8>, RenderError> {
    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| RenderError::Pdf(format!("{e:?}")))?;
    writer
        .into_inner()
        .map_err(|e| RenderError::Io(e.into_error()))
}

// ── Error document ───────────────────────────────────────────────────────

fn error_pdf(message: &str) -> Vec<u8> {
    match build_error_pdf(message) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Error PDF could not be generated either: {}", e);
            minimal_pdf("Translation Error")
        }
    }
}

fn build_error_pdf(message: &str) -> Result<Vec<u8>, RenderError> {
    let (doc, page, layer) = PdfDocument::new("Translation Error", Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = load_fonts(&doc, None)?;
    {
        let mut w = PageWriter::new(&doc, doc.get_page(page).get_layer(layer), true);
        w.cell("Translation Error", 16.0, 10.0, &fonts.title, true);
        for row in wrap_lines(&format!("Error creating translated PDF: {message}")) {
            if let RenderLine::Text(line) = row {
                w.cell(&line, 12.0, 10.0, &fonts.body, false);
            }
        }
    }
    save(doc)
}

/// A one-page PDF with a single Helvetica line, assembled by hand.
fn minimal_pdf(line: &str) -> Vec<u8> {
    let escaped: String = line
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .flat_map(|c| match c {
            '(' | ')' | '\\' => vec!['\\', c],
            c => vec![c],
        })
        .collect();
    let stream = format!("BT /F1 16 Tf 72 770 Td ({escaped}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for off in offsets {
        out.push_str(&format!("{off:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    out.into_bytes()
}
