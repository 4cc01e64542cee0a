//! DOCX text extraction.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml` as
//! WordprocessingML. Two readers exist:
//!
//! 1. **Structured**: an event parse of `word/document.xml`. Top-level body
//!    paragraphs come first, one per line, followed by every top-level table:
//!    each cell's text is followed by a tab, each row by a newline.
//! 2. **Raw**: used when the structured parse fails or finds no text
//!    (malformed XML, odd producers). Every text part under `word/` is flattened by regex, which
//!    also picks up headers, footers, footnotes and endnotes.

use super::extract::{ExtractedText, ExtractionMethod};
use crate::error::ExtractionError;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use regex::Regex;
use std::io::{Cursor, Read};
use tracing::{debug, info, warn};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

pub(crate) fn extract_docx(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let primary = match extract_structured(bytes) {
        Ok(doc) if doc.text.is_empty() => "no WordprocessingML text found".to_string(),
        Ok(doc) => {
            info!(
                "DOCX text extracted: {} paragraphs, {} tables",
                doc.paragraphs, doc.tables
            );
            return Ok(ExtractedText::new(
                doc.text,
                doc.paragraphs,
                ExtractionMethod::DocxStructured,
            ));
        }
        Err(e) => e,
    };

    warn!("Structured DOCX parse failed, trying raw extraction: {}", primary);

    extract_raw(bytes)
        .map(|(text, paragraphs)| ExtractedText::new(text, paragraphs, ExtractionMethod::DocxRaw))
        .map_err(|fallback| ExtractionError::DocxFailed {
            detail: format!("{primary}; raw extraction: {fallback}"),
        })
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, String> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a zip archive: {e}"))
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, String> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| format!("missing {name}: {e}"))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| format!("unreadable {name}: {e}"))?;
    Ok(xml)
}

// ── Structured reader ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StructuredDoc {
    text: String,
    paragraphs: usize,
    tables: usize,
}

fn extract_structured(bytes: &[u8]) -> Result<StructuredDoc, String> {
    let mut archive = open_archive(bytes)?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?;
    parse_document_xml(&xml)
}

/// WordprocessingML elements the structured reader cares about, resolved by
/// namespace so documents using a prefix other than `w:` still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Paragraph,
    Run,
    Text,
    Table,
    Row,
    Cell,
    Tab,
    Break,
    Fallback,
    Other,
}

const WORDML_NS: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const MARKUP_COMPAT_NS: &[u8] = b"http://schemas.openxmlformats.org/markup-compatibility/2006";

fn classify(ns: &ResolveResult, local: &[u8]) -> Tag {
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == WORDML_NS => match local {
            b"p" => Tag::Paragraph,
            b"r" => Tag::Run,
            b"t" => Tag::Text,
            b"tbl" => Tag::Table,
            b"tr" => Tag::Row,
            b"tc" => Tag::Cell,
            b"tab" => Tag::Tab,
            b"br" | b"cr" => Tag::Break,
            _ => Tag::Other,
        },
        ResolveResult::Bound(Namespace(uri)) if *uri == MARKUP_COMPAT_NS && local == b"Fallback" => {
            Tag::Fallback
        }
        _ => Tag::Other,
    }
}

/// Walk `word/document.xml` and rebuild the paragraph/table layout.
fn parse_document_xml(xml: &str) -> Result<StructuredDoc, String> {
    let mut reader = NsReader::from_reader(Cursor::new(xml.as_bytes()));
    reader.trim_text(false);

    let mut buf = Vec::new();
    // Open paragraphs; text boxes nest a paragraph inside another one.
    let mut open: Vec<String> = Vec::new();
    let mut body: Vec<String> = Vec::new();
    let mut table_text = String::new();
    let mut cell_paragraphs: Vec<String> = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut table_depth = 0usize;
    let mut tables = 0usize;
    let mut in_run = false;
    let mut in_text = false;
    // Word repeats text-box content inside mc:Fallback.
    let mut fallback_depth = 0usize;

    loop {
        let position = reader.buffer_position();
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| format!("XML error near byte {position}: {e}"))?;

        match event {
            Event::Start(e) => match classify(&ns, e.local_name().as_ref()) {
                Tag::Fallback => fallback_depth += 1,
                _ if fallback_depth > 0 => {}
                Tag::Paragraph => open.push(String::new()),
                Tag::Run => in_run = true,
                Tag::Text => in_text = true,
                Tag::Table => table_depth += 1,
                Tag::Row if table_depth == 1 => row_cells.clear(),
                Tag::Cell if table_depth == 1 => cell_paragraphs.clear(),
                _ => {}
            },
            Event::End(e) => match classify(&ns, e.local_name().as_ref()) {
                Tag::Fallback => fallback_depth = fallback_depth.saturating_sub(1),
                _ if fallback_depth > 0 => {}
                Tag::Paragraph => {
                    let para = open.pop().unwrap_or_default();
                    if table_depth == 0 {
                        body.push(para);
                    } else {
                        cell_paragraphs.push(para);
                    }
                }
                Tag::Run => in_run = false,
                Tag::Text => in_text = false,
                Tag::Cell if table_depth == 1 => row_cells.push(cell_paragraphs.join("\n")),
                Tag::Row if table_depth == 1 => {
                    for cell in &row_cells {
                        table_text.push_str(cell);
                        table_text.push('\t');
                    }
                    table_text.push('\n');
                }
                Tag::Table => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 {
                        tables += 1;
                    }
                }
                _ => {}
            },
            Event::Empty(e) if fallback_depth == 0 => match classify(&ns, e.local_name().as_ref()) {
                Tag::Paragraph => {
                    if table_depth == 0 {
                        body.push(String::new());
                    } else {
                        cell_paragraphs.push(String::new());
                    }
                }
                Tag::Tab if in_run => push_to_open(&mut open, "\t"),
                Tag::Break if in_run => push_to_open(&mut open, "\n"),
                _ => {}
            },
            Event::Text(e) if in_text && fallback_depth == 0 => {
                let text = e.unescape().map_err(|e| format!("bad entity: {e}"))?;
                push_to_open(&mut open, &text);
            }
            Event::CData(e) if in_text && fallback_depth == 0 => {
                push_to_open(&mut open, &String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if table_depth != 0 || !open.is_empty() {
        return Err("document.xml ended inside an open element".into());
    }

    let mut text = String::new();
    for para in &body {
        text.push_str(para);
        text.push('\n');
    }
    text.push_str(&table_text);

    debug!("document.xml: {} paragraphs, {} tables", body.len(), tables);
    Ok(StructuredDoc {
        text: text.trim().to_string(),
        paragraphs: body.len(),
        tables,
    })
}

fn push_to_open(open: &mut [String], s: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(s);
    }
}

// ── Raw reader ───────────────────────────────────────────────────────────

static TAB_STOPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:tabs>.*?</w:tabs>").unwrap());
static PARAGRAPH_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"</w:p>|<w:p/>").unwrap());
static TAB: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:tab\b[^>]*/>").unwrap());
static BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:(?:br|cr)\b[^>]*/>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Order in which the text parts are emitted.
fn part_rank(name: &str) -> Option<u8> {
    let file = name.strip_prefix("word/")?;
    if file.contains('/') || !file.ends_with(".xml") {
        return None;
    }
    match file {
        f if f.starts_with("header") => Some(0),
        "document.xml" => Some(1),
        f if f.starts_with("footer") => Some(2),
        "footnotes.xml" => Some(3),
        "endnotes.xml" => Some(4),
        _ => None,
    }
}

fn extract_raw(bytes: &[u8]) -> Result<(String, usize), String> {
    let mut archive = open_archive(bytes)?;

    let mut parts: Vec<(u8, String)> = archive
        .file_names()
        .filter_map(|n| part_rank(n).map(|r| (r, n.to_string())))
        .collect();
    parts.sort();

    if !parts.iter().any(|(_, n)| n == DOCUMENT_PART) {
        return Err(format!("missing {DOCUMENT_PART}"));
    }

    let mut sections = Vec::new();
    let mut paragraphs = 0;
    for (_, name) in &parts {
        let xml = read_part(&mut archive, name)?;
        if name == DOCUMENT_PART {
            paragraphs = PARAGRAPH_END.find_iter(&xml).count();
        }
        let text = flatten_xml(&xml);
        if !text.is_empty() {
            sections.push(text);
        }
    }

    Ok((sections.join("\n\n"), paragraphs))
}

/// Strip WordprocessingML markup, keeping paragraph breaks and tabs.
fn flatten_xml(xml: &str) -> String {
    let s = TAB_STOPS.replace_all(xml, "");
    let s = PARAGRAPH_END.replace_all(&s, "\n");
    let s = TAB.replace_all(&s, "\t");
    let s = BREAK.replace_all(&s, "\n");
    let s = ANY_TAG.replace_all(&s, "");
    let s = match quick_xml::escape::unescape(&s) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => s.into_owned(),
    };
    BLANK_RUNS.replace_all(&s, "\n\n").trim().to_string()
}
