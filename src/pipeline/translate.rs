//! Translation orchestration: detection, chunking and backend failover.
//!
//! ## Flow
//!
//! ```text
//! text ─▶ blank? ─▶ resolve source ─▶ same language? ─▶ chunk ─▶ failover chain
//!          │          (detect if auto)     │                      │
//!          ▼                               ▼                      ▼
//!      EmptyText                    original text          first backend that
//!                                   (no backend)           translates every chunk
//! ```
//!
//! A backend is all-or-nothing: if any chunk fails, its partial output is
//! discarded and the next candidate starts again from chunk 1. Chunks are
//! sent strictly in order with a short pause between calls, since the free
//! services throttle bursts aggressively.

use super::chunk::{chunk_text, Chunk};
use super::detect::LanguageDetector;
use super::langmap::BackendLanguageMap;
use crate::backends::{BackendKind, BackendRegistry};
use crate::config::{TranslationConfig, AUTO_LANGUAGE, DEFAULT_CHUNK_SIZE};
use crate::error::{BackendError, BackendFailure, DocTranslateError, TranslationError};
use crate::output::{Translation, SAME_LANGUAGE_NOTE};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parameters of one translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub target_lang: String,
    /// A language code, or `auto` to detect it.
    pub source_lang: String,
    /// First backend of the failover chain.
    pub backend: BackendKind,
    pub chunk_size: usize,
}

impl Default for TranslateRequest {
    fn default() -> Self {
        Self {
            target_lang: "en".to_string(),
            source_lang: AUTO_LANGUAGE.to_string(),
            backend: BackendKind::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TranslateRequest {
    pub fn new(target_lang: impl Into<String>) -> Self {
        Self {
            target_lang: target_lang.into(),
            ..Self::default()
        }
    }

    /// The request implied by a config's defaults.
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            target_lang: config.default_target_lang.clone(),
            source_lang: config.default_source_lang.clone(),
            backend: config.default_backend,
            chunk_size: config.chunk_size,
        }
    }

    pub fn source(mut self, code: impl Into<String>) -> Self {
        self.source_lang = code.into();
        self
    }

    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = kind;
        self
    }

    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.chunk_size = chars;
        self
    }
}

// ── Failover chain ───────────────────────────────────────────────────────

/// Ordered backend candidates for one request.
///
/// The preferred backend comes first, then the fixed fallbacks. Duplicates
/// are kept: preferring Google means Google is tried twice.
#[derive(Debug, Clone)]
pub struct FailoverChain {
    candidates: Vec<BackendKind>,
    position: usize,
    failures: Vec<BackendFailure>,
}

impl FailoverChain {
    pub const FALLBACKS: [BackendKind; 3] = [BackendKind::Google, BackendKind::Libre, BackendKind::MyMemory];

    pub fn new(preferred: BackendKind) -> Self {
        let mut candidates = Vec::with_capacity(1 + Self::FALLBACKS.len());
        candidates.push(preferred);
        candidates.extend(Self::FALLBACKS);
        Self {
            candidates,
            position: 0,
            failures: Vec::new(),
        }
    }

    pub fn candidates(&self) -> &[BackendKind] {
        &self.candidates
    }

    /// Advance to the next candidate; `None` once every candidate was tried.
    pub fn next_candidate(&mut self) -> Option<BackendKind> {
        let next = self.candidates.get(self.position).copied();
        if next.is_some() {
            self.position += 1;
        }
        next
    }

    /// Number of candidates handed out so far.
    pub fn attempts(&self) -> usize {
        self.position
    }

    pub fn record_failure(&mut self, failure: BackendFailure) {
        self.failures.push(failure);
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.candidates.len()
    }

    pub fn failures(&self) -> &[BackendFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<BackendFailure> {
        self.failures
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────

/// Translates text through the registered backends.
///
/// Cheap to share: every collaborator is behind an `Arc`.
#[derive(Clone)]
pub struct TranslationOrchestrator {
    registry: Arc<BackendRegistry>,
    language_map: Arc<BackendLanguageMap>,
    detector: LanguageDetector,
    fallback_source_lang: String,
    chunk_delay: Duration,
    batch_delay: Duration,
    progress: ProgressCallback,
}

impl TranslationOrchestrator {
    pub fn new(registry: BackendRegistry, config: &TranslationConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            language_map: Arc::new(BackendLanguageMap::default()),
            detector: LanguageDetector::new(config.min_detection_chars),
            fallback_source_lang: config.fallback_source_lang.clone(),
            chunk_delay: Duration::from_millis(config.chunk_delay_ms),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            progress: config
                .progress_callback
                .clone()
                .unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        }
    }

    pub fn with_language_map(mut self, map: Arc<BackendLanguageMap>) -> Self {
        self.language_map = map;
        self
    }

    pub fn with_detector(mut self, detector: LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Translate `text` according to `request`.
    ///
    /// # Errors
    /// * [`TranslationError::EmptyText`] for blank input
    /// * [`TranslationError::AllBackendsFailed`] when no candidate in the
    ///   failover chain translated every chunk
    pub async fn translate(
        &self,
        text: &str,
        request: &TranslateRequest,
    ) -> Result<Translation, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyText);
        }

        let target = normalize(&request.target_lang);
        let source = self.resolve_source(text, &request.source_lang);

        if source == target {
            info!("Source and target are both '{}'; skipping translation", target);
            self.progress.on_translation_complete(None, true);
            return Ok(Translation {
                translated_text: text.to_string(),
                source_language: source,
                target_language: target,
                backend_used: None,
                chunks_processed: 1,
                note: Some(SAME_LANGUAGE_NOTE.to_string()),
            });
        }

        if target == "sa" && request.backend == BackendKind::Google {
            warn!("Sanskrit may have limited support in Google Translate");
        }

        let chunks = chunk_text(text, request.chunk_size.max(1));
        info!(
            "Translating {} chars {}→{} in {} chunk(s), preferring {}",
            text.chars().count(),
            source,
            target,
            chunks.len(),
            request.backend
        );
        self.progress.on_translation_start(chunks.len());

        let mut chain = FailoverChain::new(request.backend);
        while let Some(kind) = chain.next_candidate() {
            self.progress.on_backend_start(kind, chain.attempts());

            match self.run_backend(kind, &chunks, &source, &target).await {
                Ok(parts) => {
                    info!("Translation complete with {} ({} chunks)", kind, parts.len());
                    self.progress.on_translation_complete(Some(kind), true);
                    return Ok(Translation {
                        translated_text: parts.join(" "),
                        source_language: source,
                        target_language: target,
                        backend_used: Some(kind),
                        chunks_processed: chunks.len(),
                        note: None,
                    });
                }
                Err(failure) => {
                    warn!(
                        "Backend {} failed on chunk {}/{}: {}",
                        kind,
                        failure.chunk,
                        chunks.len(),
                        failure.error
                    );
                    self.progress
                        .on_backend_failed(kind, failure.chunk, &failure.error.to_string());
                    chain.record_failure(failure);
                }
            }
        }

        warn!("All translation backends failed ({} attempts)", chain.attempts());
        self.progress.on_translation_complete(None, false);
        Err(TranslationError::AllBackendsFailed {
            source_lang: source,
            target_lang: target,
            attempts: chain.into_failures(),
        })
    }

    /// Translate several texts one after another, pausing between them.
    pub async fn batch_translate<S: AsRef<str>>(
        &self,
        texts: &[S],
        request: &TranslateRequest,
    ) -> Vec<Result<Translation, TranslationError>> {
        let mut results = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            info!("Translating text {}/{}", i + 1, texts.len());
            results.push(self.translate(text.as_ref(), request).await);
            if i + 1 < texts.len() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }
        results
    }

    /// Blocking wrapper around [`translate`](Self::translate).
    ///
    /// Creates a Tokio runtime; must not be called from inside one.
    pub fn translate_sync(
        &self,
        text: &str,
        request: &TranslateRequest,
    ) -> Result<Translation, DocTranslateError> {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| DocTranslateError::Internal(format!("Failed to create runtime: {e}")))?;
        Ok(rt.block_on(self.translate(text, request))?)
    }

    fn resolve_source(&self, text: &str, requested: &str) -> String {
        let requested = normalize(requested);
        if requested != AUTO_LANGUAGE {
            return requested;
        }
        match self.detector.detect(text) {
            Ok(detection) => {
                debug!(
                    "Detected source language {} (confidence {:.2})",
                    detection.language, detection.confidence
                );
                detection.language
            }
            Err(e) => {
                warn!(
                    "Language detection failed ({}); assuming '{}'",
                    e, self.fallback_source_lang
                );
                self.fallback_source_lang.clone()
            }
        }
    }

    /// Translate every chunk with one backend, or report where it failed.
    async fn run_backend(
        &self,
        kind: BackendKind,
        chunks: &[Chunk],
        source: &str,
        target: &str,
    ) -> Result<Vec<String>, BackendFailure> {
        let backend = self.registry.get(kind).ok_or(BackendFailure {
            backend: kind,
            chunk: 1,
            error: BackendError::NotConfigured { backend: kind },
        })?;

        let source_code = self.language_map.map_code(source, kind);
        let target_code = self.language_map.map_code(target, kind);
        let total = chunks.len();
        let mut parts = Vec::with_capacity(total);

        for chunk in chunks {
            let n = chunk.index + 1;
            debug!("{}: chunk {}/{} ({} chars)", kind, n, total, chunk.text.chars().count());

            let translated = backend
                .translate(&chunk.text, source_code, target_code)
                .await
                .map_err(|error| BackendFailure {
                    backend: kind,
                    chunk: n,
                    error,
                })?;

            parts.push(if translated.trim().is_empty() {
                chunk.text.clone()
            } else {
                translated
            });
            self.progress.on_chunk_complete(kind, n, total);

            if n < total && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        Ok(parts)
    }
}

impl std::fmt::Debug for TranslationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationOrchestrator")
            .field("registry", &self.registry)
            .field("detector", &self.detector)
            .field("fallback_source_lang", &self.fallback_source_lang)
            .field("chunk_delay", &self.chunk_delay)
            .field("batch_delay", &self.batch_delay)
            .finish_non_exhaustive()
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::TranslationBackend;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the chunk back wrapped in the backend name and language pair.
    struct Echo {
        kind: BackendKind,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl Echo {
        fn new(kind: BackendKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TranslationBackend for Echo {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, BackendError> {
            self.seen
                .lock()
                .unwrap()
                .push((text.to_string(), source.to_string(), target.to_string()));
            Ok(format!("[{}]", text.to_uppercase()))
        }
    }

    /// Succeeds on the first `ok_calls` calls, then fails.
    struct FailsAfter {
        kind: BackendKind,
        ok_calls: usize,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl TranslationBackend for FailsAfter {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn translate(&self, text: &str, _s: &str, _t: &str) -> Result<String, BackendError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls > self.ok_calls {
                Err(BackendError::Http {
                    status: 503,
                    body: "unavailable".into(),
                })
            } else {
                Ok(format!("partial:{text}"))
            }
        }
    }

    fn quiet_config() -> TranslationConfig {
        TranslationConfig::builder()
            .chunk_delay_ms(0)
            .batch_delay_ms(0)
            .build()
            .unwrap()
    }

    #[test]
    fn chain_order_keeps_duplicates() {
        let mut chain = FailoverChain::new(BackendKind::Google);
        assert_eq!(
            chain.candidates(),
            &[BackendKind::Google, BackendKind::Google, BackendKind::Libre, BackendKind::MyMemory]
        );
        let mut seen = Vec::new();
        while let Some(k) = chain.next_candidate() {
            seen.push(k);
        }
        assert_eq!(seen.len(), 4);
        assert!(chain.is_exhausted());
        assert_eq!(chain.next_candidate(), None);
        assert_eq!(chain.attempts(), 4);
    }

    #[test]
    fn chain_prefers_requested_backend() {
        let mut chain = FailoverChain::new(BackendKind::Microsoft);
        assert_eq!(chain.next_candidate(), Some(BackendKind::Microsoft));
        assert_eq!(chain.next_candidate(), Some(BackendKind::Google));
        assert!(!chain.is_exhausted());
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let orch = TranslationOrchestrator::new(BackendRegistry::empty(), &quiet_config());
        let err = orch.translate("   \n", &TranslateRequest::new("hi")).await.unwrap_err();
        assert_eq!(err, TranslationError::EmptyText);
    }

    #[tokio::test]
    async fn same_language_calls_no_backend() {
        let echo = Echo::new(BackendKind::Google);
        let orch = TranslationOrchestrator::new(BackendRegistry::empty().with(echo.clone()), &quiet_config());
        let t = orch
            .translate("Hello there", &TranslateRequest::new("en").source("EN"))
            .await
            .unwrap();
        assert_eq!(t.translated_text, "Hello there");
        assert_eq!(t.chunks_processed, 1);
        assert_eq!(t.backend_used, None);
        assert_eq!(t.note.as_deref(), Some(SAME_LANGUAGE_NOTE));
        assert!(echo.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_detection_uses_fallback_source() {
        // "hi" is too short to detect, so the source falls back to "en",
        // which equals the target.
        let orch = TranslationOrchestrator::new(BackendRegistry::empty(), &quiet_config());
        let t = orch.translate("hi", &TranslateRequest::new("en")).await.unwrap();
        assert_eq!(t.source_language, "en");
        assert_eq!(t.backend_used, None);
    }

    #[tokio::test]
    async fn partial_output_is_discarded_on_failover() {
        let registry = BackendRegistry::empty()
            .with(Arc::new(FailsAfter {
                kind: BackendKind::Libre,
                ok_calls: 1,
                calls: Mutex::new(0),
            }))
            .with(Echo::new(BackendKind::Google));
        let orch = TranslationOrchestrator::new(registry, &quiet_config());

        let request = TranslateRequest::new("hi")
            .source("en")
            .backend(BackendKind::Libre)
            .chunk_size(8);
        let t = orch.translate("aaa bbb ccc ddd", &request).await.unwrap();

        assert_eq!(t.backend_used, Some(BackendKind::Google));
        assert_eq!(t.translated_text, "[AAA BBB] [CCC DDD]");
        assert_eq!(t.chunks_processed, 2);
        assert!(!t.translated_text.contains("partial"));
    }

    #[tokio::test(start_paused = true)]
    async fn chunk_delay_only_between_chunks() {
        let config = TranslationConfig::builder()
            .chunk_delay_ms(100)
            .batch_delay_ms(0)
            .build()
            .unwrap();
        let orch = TranslationOrchestrator::new(BackendRegistry::empty().with(Echo::new(BackendKind::Google)), &config);
        let request = TranslateRequest::new("hi").source("en").chunk_size(4);

        let started = tokio::time::Instant::now();
        let t = orch.translate("aaa bbb ccc ddd", &request).await.unwrap();

        assert_eq!(t.chunks_processed, 4);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn sanskrit_is_remapped_per_backend() {
        let libre = Echo::new(BackendKind::Libre);
        let orch = TranslationOrchestrator::new(BackendRegistry::empty().with(libre.clone()), &quiet_config());
        let request = TranslateRequest::new("sa").source("hi").backend(BackendKind::Libre);
        orch.translate("नमस्ते", &request).await.unwrap();

        let seen = libre.seen.lock().unwrap();
        assert_eq!(seen[0].1, "hi");
        assert_eq!(seen[0].2, "en");
    }

    #[tokio::test]
    async fn empty_backend_output_keeps_original_chunk() {
        struct Blank;

        #[async_trait]
        impl TranslationBackend for Blank {
            fn kind(&self) -> BackendKind {
                BackendKind::Google
            }

            async fn translate(&self, _t: &str, _s: &str, _g: &str) -> Result<String, BackendError> {
                Ok("  ".into())
            }
        }

        let orch = TranslationOrchestrator::new(BackendRegistry::empty().with(Arc::new(Blank)), &quiet_config());
        let t = orch
            .translate("untranslatable", &TranslateRequest::new("hi").source("en"))
            .await
            .unwrap();
        assert_eq!(t.translated_text, "untranslatable");
    }

    #[tokio::test]
    async fn exhaustion_reports_every_attempt() {
        let orch = TranslationOrchestrator::new(BackendRegistry::empty(), &quiet_config());
        let request = TranslateRequest::new("hi").source("en").backend(BackendKind::Microsoft);
        let err = orch.translate("some text", &request).await.unwrap_err();

        match err {
            TranslationError::AllBackendsFailed { attempts, source_lang, .. } => {
                assert_eq!(source_lang, "en");
                let kinds: Vec<_> = attempts.iter().map(|a| a.backend).collect();
                assert_eq!(
                    kinds,
                    vec![BackendKind::Microsoft, BackendKind::Google, BackendKind::Libre, BackendKind::MyMemory]
                );
                assert!(attempts
                    .iter()
                    .all(|a| matches!(a.error, BackendError::NotConfigured { .. })));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_returns_one_result_per_text() {
        let orch = TranslationOrchestrator::new(
            BackendRegistry::empty().with(Echo::new(BackendKind::Google)),
            &quiet_config(),
        );
        let request = TranslateRequest::new("hi").source("en");
        let results = orch.batch_translate(&["one", "", "three"], &request).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().translated_text, "[ONE]");
        assert_eq!(results[1], Err(TranslationError::EmptyText));
        assert!(results[2].is_ok());
    }

    #[test]
    fn translate_sync_outside_runtime() {
        let orch = TranslationOrchestrator::new(
            BackendRegistry::empty().with(Echo::new(BackendKind::Google)),
            &quiet_config(),
        );
        let t = orch
            .translate_sync("good morning", &TranslateRequest::new("mr").source("en"))
            .unwrap();
        assert_eq!(t.translated_text, "[GOOD MORNING]");
    }
}
