//! Integration tests for the document pipeline.
//!
//! Backends are in-process fakes registered on a [`BackendRegistry`], so
//! nothing here touches the network. PDF extraction is not covered: it needs
//! a pdfium library or a real PDF fixture.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use doctranslate::{
    chunk_text, render_pdf, BackendError, BackendKind, BackendRegistry, DocTranslateError, DocumentTranslator,
    ExtractionError, ExtractionMethod, TranslateRequest, TranslationBackend, TranslationConfig, TranslationError,
    TranslationProgressCallback,
};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Shared record of which backend saw which chunk.
type CallLog = Arc<Mutex<Vec<(BackendKind, String)>>>;

/// Upper-cases every chunk.
struct Shouting {
    kind: BackendKind,
    calls: CallLog,
}

#[async_trait]
impl TranslationBackend for Shouting {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push((self.kind, text.to_string()));
        Ok(text.to_uppercase())
    }
}

/// Always fails with a 503.
struct Down {
    kind: BackendKind,
    calls: CallLog,
}

#[async_trait]
impl TranslationBackend for Down {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push((self.kind, text.to_string()));
        Err(BackendError::Http {
            status: 503,
            body: "service unavailable".into(),
        })
    }
}

fn shouting(kind: BackendKind, calls: &CallLog) -> Arc<dyn TranslationBackend> {
    Arc::new(Shouting {
        kind,
        calls: Arc::clone(calls),
    })
}

fn down(kind: BackendKind, calls: &CallLog) -> Arc<dyn TranslationBackend> {
    Arc::new(Down {
        kind,
        calls: Arc::clone(calls),
    })
}

fn quiet_config() -> TranslationConfig {
    TranslationConfig::builder()
        .chunk_delay_ms(0)
        .batch_delay_ms(0)
        .build()
        .unwrap()
}

fn backends_called(calls: &CallLog) -> Vec<BackendKind> {
    let mut kinds: Vec<BackendKind> = calls.lock().unwrap().iter().map(|(k, _)| *k).collect();
    kinds.dedup();
    kinds
}

/// Build a minimal `.docx` with the given `word/document.xml`.
fn docx_with(document_xml: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types/>"#)
        .unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(document_xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn word_body(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

// ── Documents end to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn text_document_is_translated_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("translations.log");
    let config = TranslationConfig::builder()
        .chunk_delay_ms(0)
        .log_file(&log_path)
        .build()
        .unwrap();

    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty().with(shouting(BackendKind::Google, &calls));
    let translator = DocumentTranslator::with_registry(config, registry);

    let request = TranslateRequest::new("hi").source("en");
    let doc = translator
        .translate_document(b"hello from the test suite", "greeting.txt", &request)
        .await
        .unwrap();

    assert_eq!(doc.translation.translated_text, "HELLO FROM THE TEST SUITE");
    assert_eq!(doc.translation.backend_used, Some(BackendKind::Google));
    assert_eq!(doc.translation.chunks_processed, 1);
    assert_eq!(doc.extraction.method, ExtractionMethod::Direct);
    assert!(doc.detection.is_none());
    assert_eq!(doc.file.extension, ".txt");

    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("| SUCCESS | greeting.txt | en→hi"), "{}", lines[0]);
}

#[tokio::test]
async fn failed_document_logs_one_failure_line() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("translations.log");
    let config = TranslationConfig::builder()
        .chunk_delay_ms(0)
        .log_file(&log_path)
        .build()
        .unwrap();

    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty()
        .with(down(BackendKind::Google, &calls))
        .with(down(BackendKind::Libre, &calls))
        .with(down(BackendKind::MyMemory, &calls));
    let translator = DocumentTranslator::with_registry(config, registry);

    let request = TranslateRequest::new("mr").source("en");
    let err = translator
        .translate_document(b"nobody is listening", "notes.txt", &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocTranslateError::Translation(TranslationError::AllBackendsFailed { .. })
    ));
    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("| FAILED | notes.txt | en→mr | Error: "), "{}", lines[0]);
}

#[tokio::test]
async fn docx_paragraphs_come_before_tables() {
    let xml = word_body(
        "<w:p><w:r><w:t>Quarterly report</w:t></w:r></w:p>\
         <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Region</w:t></w:r></w:p></w:tc>\
         <w:tc><w:p><w:r><w:t>Sales</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
         <w:p><w:r><w:t>Prepared by finance</w:t></w:r></w:p>",
    );
    let translator = DocumentTranslator::with_registry(quiet_config(), BackendRegistry::empty());

    let (info, extracted) = translator.extract(&docx_with(&xml), "report.docx").await.unwrap();

    assert_eq!(info.extension, ".docx");
    assert_eq!(extracted.method, ExtractionMethod::DocxStructured);
    assert_eq!(extracted.text, "Quarterly report\nPrepared by finance\nRegion\tSales");
    assert_eq!(extracted.units, 2);
}

#[tokio::test]
async fn malformed_docx_uses_raw_extraction() {
    let xml = "<w:document><w:body><w:p><w:r><w:t>Still readable</w:t></w:r></w:body></w:document>";
    let translator = DocumentTranslator::with_registry(quiet_config(), BackendRegistry::empty());

    let (_, extracted) = translator.extract(&docx_with(xml), "broken.docx").await.unwrap();

    assert_eq!(extracted.method, ExtractionMethod::DocxRaw);
    assert_eq!(extracted.text, "Still readable");
}

#[tokio::test]
async fn docx_with_custom_prefix_is_structured() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?><ns0:document xmlns:ns0="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><ns0:body><ns0:p><ns0:r><ns0:t>Exported elsewhere</ns0:t></ns0:r></ns0:p></ns0:body></ns0:document>"#;
    let translator = DocumentTranslator::with_registry(quiet_config(), BackendRegistry::empty());

    let (_, extracted) = translator.extract(&docx_with(xml), "exported.docx").await.unwrap();

    assert_eq!(extracted.method, ExtractionMethod::DocxStructured);
    assert_eq!(extracted.text, "Exported elsewhere");
}

#[tokio::test]
async fn docx_without_namespaces_falls_back_to_raw() {
    let xml = "<w:document><w:body><w:p><w:r><w:t>No namespace here</w:t></w:r></w:p></w:body></w:document>";
    let translator = DocumentTranslator::with_registry(quiet_config(), BackendRegistry::empty());

    let (_, extracted) = translator.extract(&docx_with(xml), "bare.docx").await.unwrap();

    assert_eq!(extracted.method, ExtractionMethod::DocxRaw);
    assert_eq!(extracted.text, "No namespace here");
}

#[tokio::test]
async fn docx_that_is_not_a_zip_fails_extraction() {
    let translator = DocumentTranslator::with_registry(quiet_config(), BackendRegistry::empty());
    let err = translator.extract(b"plain text pretending", "fake.docx").await.unwrap_err();
    assert!(matches!(
        err,
        DocTranslateError::Extraction(ExtractionError::DocxFailed { .. })
    ));
}

#[tokio::test]
async fn latin1_text_is_decoded() {
    // "café crème" in ISO-8859-1
    let bytes = b"caf\xe9 cr\xe8me";
    let translator = DocumentTranslator::with_registry(quiet_config(), BackendRegistry::empty());

    let (_, extracted) = translator.extract(bytes, "menu.txt").await.unwrap();

    assert_eq!(extracted.text, "café crème");
    assert_eq!(extracted.method, ExtractionMethod::DirectEncoding("latin-1"));
}

// ── Upload validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn validation_checks_size_then_extension_then_emptiness() {
    let config = TranslationConfig::builder()
        .max_file_size(8)
        .build()
        .unwrap();
    let translator = DocumentTranslator::with_registry(config, BackendRegistry::empty());

    let too_big = translator.extract(b"0123456789", "virus.exe").await.unwrap_err();
    assert!(matches!(too_big, DocTranslateError::FileTooLarge { .. }));

    let wrong_ext = translator.extract(b"", "virus.exe").await.unwrap_err();
    assert!(matches!(wrong_ext, DocTranslateError::UnsupportedFormat { ref extension } if extension == ".exe"));

    let empty = translator.extract(b"", "empty.txt").await.unwrap_err();
    assert!(matches!(empty, DocTranslateError::EmptyFile));
}

// ── Failover ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preferred_backend_failing_falls_back_to_google() {
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty()
        .with(down(BackendKind::Libre, &calls))
        .with(shouting(BackendKind::Google, &calls));
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let text = "one two three four five six";
    let request = TranslateRequest::new("hi")
        .source("en")
        .backend(BackendKind::Libre)
        .chunk_size(10);
    let translation = translator.orchestrator().translate(text, &request).await.unwrap();

    assert_eq!(translation.backend_used, Some(BackendKind::Google));
    assert_eq!(translation.chunks_processed, chunk_text(text, 10).len());
    assert_eq!(translation.translated_text, text.to_uppercase());
    assert_eq!(backends_called(&calls), vec![BackendKind::Libre, BackendKind::Google]);
}

#[tokio::test]
async fn failover_order_is_preferred_then_google_libre_mymemory() {
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty()
        .with(down(BackendKind::Microsoft, &calls))
        .with(down(BackendKind::Google, &calls))
        .with(down(BackendKind::Libre, &calls))
        .with(down(BackendKind::MyMemory, &calls));
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let request = TranslateRequest::new("en")
        .source("hi")
        .backend(BackendKind::Microsoft);
    let err = translator
        .orchestrator()
        .translate("kuch bhi", &request)
        .await
        .unwrap_err();

    assert_eq!(
        backends_called(&calls),
        vec![
            BackendKind::Microsoft,
            BackendKind::Google,
            BackendKind::Libre,
            BackendKind::MyMemory
        ]
    );
    match err {
        TranslationError::AllBackendsFailed { attempts, .. } => {
            assert_eq!(attempts.len(), 4);
            assert!(attempts.iter().all(|a| a.chunk == 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unregistered_backends_are_skipped() {
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty().with(shouting(BackendKind::MyMemory, &calls));
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let request = TranslateRequest::new("en").source("mr").backend(BackendKind::Microsoft);
    let translation = translator.orchestrator().translate("namaskar", &request).await.unwrap();

    assert_eq!(translation.backend_used, Some(BackendKind::MyMemory));
    assert_eq!(translation.translated_text, "NAMASKAR");
}

#[tokio::test]
async fn same_language_skips_every_backend() {
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty().with(shouting(BackendKind::Google, &calls));
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let request = TranslateRequest::new("en").source("EN");
    let translation = translator
        .orchestrator()
        .translate("already english", &request)
        .await
        .unwrap();

    assert_eq!(translation.translated_text, "already english");
    assert_eq!(translation.backend_used, None);
    assert_eq!(translation.chunks_processed, 1);
    assert!(translation.note.is_some());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sanskrit_source_is_sent_to_libre_as_english() {
    struct Capture(Mutex<Vec<String>>);

    #[async_trait]
    impl TranslationBackend for Capture {
        fn kind(&self) -> BackendKind {
            BackendKind::Libre
        }

        async fn translate(&self, text: &str, source: &str, _target: &str) -> Result<String, BackendError> {
            self.0.lock().unwrap().push(source.to_string());
            Ok(text.to_string())
        }
    }

    let capture = Arc::new(Capture(Mutex::new(Vec::new())));
    let registry = BackendRegistry::empty().with(capture.clone());
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let request = TranslateRequest::new("hi").source("sa").backend(BackendKind::Libre);
    translator.orchestrator().translate("om shanti", &request).await.unwrap();

    assert_eq!(*capture.0.lock().unwrap(), vec!["en".to_string()]);
}

// ── Progress and output ──────────────────────────────────────────────────────

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl TranslationProgressCallback for Events {
    fn on_backend_failed(&self, backend: BackendKind, chunk: usize, _error: &str) {
        self.0.lock().unwrap().push(format!("failed:{backend}:{chunk}"));
    }

    fn on_translation_complete(&self, backend: Option<BackendKind>, success: bool) {
        self.0.lock().unwrap().push(format!("done:{backend:?}:{success}"));
    }
}

#[tokio::test]
async fn progress_reports_failover() {
    let events = Arc::new(Events::default());
    let config = TranslationConfig::builder()
        .chunk_delay_ms(0)
        .progress_callback(events.clone())
        .build()
        .unwrap();
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty()
        .with(down(BackendKind::Libre, &calls))
        .with(shouting(BackendKind::Google, &calls));
    let translator = DocumentTranslator::with_registry(config, registry);

    let request = TranslateRequest::new("hi").source("en").backend(BackendKind::Libre);
    translator.orchestrator().translate("hello", &request).await.unwrap();

    assert_eq!(
        *events.0.lock().unwrap(),
        vec!["failed:libre:1".to_string(), "done:Some(Google):true".to_string()]
    );
}

#[tokio::test]
async fn translated_document_renders_and_writes_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty().with(shouting(BackendKind::Google, &calls));
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let long_line = "word ".repeat(60);
    let request = TranslateRequest::new("hi").source("en");
    let doc = translator
        .translate_document(long_line.as_bytes(), "long.txt", &request)
        .await
        .unwrap();

    let pdf = translator.render_pdf(&doc);
    assert!(pdf.starts_with(b"%PDF"));

    let out = dir.path().join("out/long_hi.pdf");
    doctranslate::write_output(&out, &pdf).await.unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), pdf);
}

#[test]
fn render_pdf_handles_blank_text() {
    let pdf = render_pdf("blank.txt", "   \n  ", "en", "hi");
    assert!(!pdf.is_empty());
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn sync_wrapper_runs_outside_a_runtime() {
    let calls: CallLog = Default::default();
    let registry = BackendRegistry::empty().with(shouting(BackendKind::Google, &calls));
    let translator = DocumentTranslator::with_registry(quiet_config(), registry);

    let request = TranslateRequest::new("hi").source("en");
    let doc = translator
        .translate_document_sync(b"sync path", "sync.txt", &request)
        .unwrap();
    assert_eq!(doc.translation.translated_text, "SYNC PATH");
}
