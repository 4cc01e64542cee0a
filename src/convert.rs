//! Document-level entry points.
//!
//! [`DocumentTranslator`] runs one upload through the whole pipeline:
//!
//! ```text
//! validate ──▶ extract ──▶ detect ──▶ translate ──▶ log
//! (size/ext)  (blocking)  (if auto)  (failover)    (one line)
//! ```
//!
//! Rendering is left to the caller ([`DocumentTranslator::render_pdf`],
//! [`crate::pipeline::render::render_text`]) because not every caller wants a
//! PDF; [`write_output`] stores either artifact atomically.

use crate::backends::BackendRegistry;
use crate::config::{TranslationConfig, AUTO_LANGUAGE};
use crate::error::DocTranslateError;
use crate::history::TranslationLog;
use crate::output::DocumentTranslation;
use crate::pipeline::detect::LanguageDetector;
use crate::pipeline::extract::{self, ExtractedText};
use crate::pipeline::input::{self, FileInfo};
use crate::pipeline::render::{self, RenderOptions};
use crate::pipeline::translate::{TranslateRequest, TranslationOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Translates uploaded documents.
///
/// # Example
/// ```rust,no_run
/// use doctranslate::{DocumentTranslator, TranslateRequest, TranslationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let translator = DocumentTranslator::new(TranslationConfig::default());
/// let bytes = std::fs::read("notes.docx")?;
/// let result = translator
///     .translate_document(&bytes, "notes.docx", &TranslateRequest::new("hi"))
///     .await?;
/// println!("{}", result.translation.translated_text);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DocumentTranslator {
    config: TranslationConfig,
    orchestrator: TranslationOrchestrator,
    log: Arc<TranslationLog>,
}

impl DocumentTranslator {
    /// Use the HTTP backends described by `config.backends`.
    pub fn new(config: TranslationConfig) -> Self {
        let registry = BackendRegistry::from_settings(&config.backends);
        Self::with_registry(config, registry)
    }

    /// Use a caller-supplied backend registry.
    pub fn with_registry(config: TranslationConfig, registry: BackendRegistry) -> Self {
        let log = match &config.log_file {
            Some(path) => TranslationLog::with_file(path),
            None => TranslationLog::new(),
        };
        Self {
            orchestrator: TranslationOrchestrator::new(registry, &config),
            log: Arc::new(log),
            config,
        }
    }

    pub fn with_detector(mut self, detector: LanguageDetector) -> Self {
        self.orchestrator = self.orchestrator.with_detector(detector);
        self
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &TranslationOrchestrator {
        &self.orchestrator
    }

    pub fn log(&self) -> &TranslationLog {
        &self.log
    }

    /// A request carrying the configured defaults.
    pub fn default_request(&self) -> TranslateRequest {
        TranslateRequest::from_config(&self.config)
    }

    /// Validate an upload and extract its text without translating it.
    pub async fn extract(&self, bytes: &[u8], filename: &str) -> Result<(FileInfo, ExtractedText), DocTranslateError> {
        let (format, info) = input::validate_file(bytes, filename, self.config.max_file_size)?;

        let owned = bytes.to_vec();
        let started = Instant::now();
        let extracted = tokio::task::spawn_blocking(move || extract::extract(&owned, format))
            .await
            .map_err(|e| DocTranslateError::Internal(format!("Extraction task panicked: {e}")))??;

        info!(
            "Extracted {} chars from {} via {} in {}ms",
            extracted.text.chars().count(),
            filename,
            extracted.method,
            started.elapsed().as_millis()
        );

        if extracted.is_blank() {
            return Err(DocTranslateError::NoTextFound {
                filename: filename.to_string(),
            });
        }
        Ok((info, extracted))
    }

    /// Run one upload through the pipeline and log the outcome.
    ///
    /// # Errors
    /// Validation, extraction and translation failures. Exactly one log line
    /// is written either way.
    pub async fn translate_document(
        &self,
        bytes: &[u8],
        filename: &str,
        request: &TranslateRequest,
    ) -> Result<DocumentTranslation, DocTranslateError> {
        let mut source_for_log = request.source_lang.clone();
        let result = self.run(bytes, filename, request, &mut source_for_log).await;

        match &result {
            Ok(doc) => self.log.log_translation(
                filename,
                &doc.translation.source_language,
                &doc.translation.target_language,
                true,
                None,
            ),
            Err(e) => self.log.log_translation(
                filename,
                &source_for_log,
                &request.target_lang,
                false,
                Some(&e.to_string()),
            ),
        };
        result
    }

    async fn run(
        &self,
        bytes: &[u8],
        filename: &str,
        request: &TranslateRequest,
        source_for_log: &mut String,
    ) -> Result<DocumentTranslation, DocTranslateError> {
        let started = Instant::now();
        info!("Translating document {} → {}", filename, request.target_lang);

        let (file, extraction) = self.extract(bytes, filename).await?;

        // Detect here so the result can be reported; the orchestrator then
        // receives a concrete source and does not detect a second time.
        let mut detection = None;
        let source = if request.source_lang.trim().eq_ignore_ascii_case(AUTO_LANGUAGE) {
            match self.orchestrator.detector().detect(&extraction.text) {
                Ok(d) => {
                    info!("Detected {} (confidence {:.2})", d.language, d.confidence);
                    let lang = d.language.clone();
                    detection = Some(d);
                    lang
                }
                Err(e) => {
                    warn!(
                        "Language detection failed ({}); assuming '{}'",
                        e, self.config.fallback_source_lang
                    );
                    self.config.fallback_source_lang.clone()
                }
            }
        } else {
            request.source_lang.clone()
        };
        *source_for_log = source.clone();

        let resolved = request.clone().source(source);
        let translation = self.orchestrator.translate(&extraction.text, &resolved).await?;

        debug!("Document pipeline finished in {}ms", started.elapsed().as_millis());
        Ok(DocumentTranslation {
            file,
            extraction,
            detection,
            translation,
        })
    }

    /// Blocking wrapper around [`translate_document`](Self::translate_document).
    ///
    /// Creates a Tokio runtime; must not be called from inside one.
    pub fn translate_document_sync(
        &self,
        bytes: &[u8],
        filename: &str,
        request: &TranslateRequest,
    ) -> Result<DocumentTranslation, DocTranslateError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| DocTranslateError::Internal(format!("Failed to create tokio runtime: {e}")))?
            .block_on(self.translate_document(bytes, filename, request))
    }

    /// PDF report of a finished translation, using the configured font.
    pub fn render_pdf(&self, doc: &DocumentTranslation) -> Vec<u8> {
        let options = RenderOptions {
            font_path: self.config.pdf_font_path.clone(),
            generated_at: None,
        };
        render::render_pdf_with(
            &options,
            &doc.file.name,
            &doc.translation.translated_text,
            &doc.translation.source_language,
            &doc.translation.target_language,
        )
    }
}

/// Write an artifact atomically (temp file + rename).
pub async fn write_output(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), DocTranslateError> {
    let path = path.as_ref();
    let fail = |source| DocTranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path = temp_path_for(path);
    tokio::fs::write(&tmp_path, bytes).await.map_err(fail)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
