//! Configuration types for document translation.
//!
//! Everything the pipeline needs to know lives in [`TranslationConfig`], built
//! through [`TranslationConfigBuilder`]. Per-request knobs (target, source,
//! backend, chunk size) have defaults here and can be overridden on each
//! [`crate::pipeline::translate::TranslateRequest`].

use crate::backends::BackendKind;
use crate::error::DocTranslateError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default upload limit: 16 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Default characters per translation chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Source-language value that asks for detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Configuration for the document translator.
///
/// # Example
/// ```rust
/// use doctranslate::{BackendKind, TranslationConfig};
///
/// let config = TranslationConfig::builder()
///     .target_lang("hi")
///     .backend(BackendKind::Libre)
///     .chunk_size(2000)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 2000);
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Target language when a request does not name one. Default: `en`.
    pub default_target_lang: String,

    /// Source language when a request does not name one. Default: `auto`.
    pub default_source_lang: String,

    /// First backend of the failover chain. Default: Google.
    pub default_backend: BackendKind,

    /// Maximum characters per chunk sent to a backend. Default: 5000.
    ///
    /// The keyless Google endpoint and LibreTranslate accept 5000 characters
    /// comfortably. MyMemory rejects anonymous queries above 500 bytes, so a
    /// MyMemory-first setup wants a much smaller value.
    pub chunk_size: usize,

    /// Pause between consecutive chunk calls in milliseconds. Default: 100.
    pub chunk_delay_ms: u64,

    /// Pause between texts in a batch in milliseconds. Default: 200.
    pub batch_delay_ms: u64,

    /// Source language assumed when detection fails. Default: `en`.
    pub fallback_source_lang: String,

    /// Minimum cleaned length before detection is attempted. Default: 10.
    pub min_detection_chars: usize,

    /// Upload size limit in bytes. Default: 16 MiB.
    pub max_file_size: u64,

    /// Append one line per request here. None = tracing only.
    pub log_file: Option<PathBuf>,

    /// TrueType font for PDF output. None = built-in Helvetica.
    pub pdf_font_path: Option<PathBuf>,

    /// Endpoints and credentials for the HTTP backends.
    pub backends: BackendSettings,

    /// Optional progress events for chunk-level feedback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_target_lang: "en".to_string(),
            default_source_lang: AUTO_LANGUAGE.to_string(),
            default_backend: BackendKind::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay_ms: 100,
            batch_delay_ms: 200,
            fallback_source_lang: "en".to_string(),
            min_detection_chars: 10,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            log_file: None,
            pdf_font_path: None,
            backends: BackendSettings::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("default_target_lang", &self.default_target_lang)
            .field("default_source_lang", &self.default_source_lang)
            .field("default_backend", &self.default_backend)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_delay_ms", &self.chunk_delay_ms)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .field("fallback_source_lang", &self.fallback_source_lang)
            .field("min_detection_chars", &self.min_detection_chars)
            .field("max_file_size", &self.max_file_size)
            .field("log_file", &self.log_file)
            .field("pdf_font_path", &self.pdf_font_path)
            .field("backends", &self.backends)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn TranslationProgressCallback>"),
            )
            .finish()
    }
}

impl TranslationConfig {
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn target_lang(mut self, code: impl Into<String>) -> Self {
        self.config.default_target_lang = normalize_code(code.into());
        self
    }

    pub fn source_lang(mut self, code: impl Into<String>) -> Self {
        self.config.default_source_lang = normalize_code(code.into());
        self
    }

    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.config.default_backend = kind;
        self
    }

    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars;
        self
    }

    pub fn chunk_delay_ms(mut self, ms: u64) -> Self {
        self.config.chunk_delay_ms = ms;
        self
    }

    pub fn batch_delay_ms(mut self, ms: u64) -> Self {
        self.config.batch_delay_ms = ms;
        self
    }

    pub fn fallback_source_lang(mut self, code: impl Into<String>) -> Self {
        self.config.fallback_source_lang = normalize_code(code.into());
        self
    }

    pub fn min_detection_chars(mut self, n: usize) -> Self {
        self.config.min_detection_chars = n;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub fn pdf_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdf_font_path = Some(path.into());
        self
    }

    pub fn backends(mut self, settings: BackendSettings) -> Self {
        self.config.backends = settings;
        self
    }

    pub fn libre_url(mut self, url: impl Into<String>) -> Self {
        self.config.backends.libre_url = url.into();
        self
    }

    pub fn libre_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.backends.libre_api_key = Some(key.into());
        self
    }

    pub fn microsoft_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.backends.microsoft_api_key = Some(key.into());
        self
    }

    pub fn microsoft_region(mut self, region: impl Into<String>) -> Self {
        self.config.backends.microsoft_region = Some(region.into());
        self
    }

    pub fn mymemory_email(mut self, email: impl Into<String>) -> Self {
        self.config.backends.mymemory_email = Some(email.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.backends.request_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, DocTranslateError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(DocTranslateError::InvalidConfig(
                "chunk size must be at least 1 character".into(),
            ));
        }
        if c.max_file_size == 0 {
            return Err(DocTranslateError::InvalidConfig(
                "maximum file size must be greater than zero".into(),
            ));
        }
        if c.default_target_lang.is_empty() || c.default_target_lang == AUTO_LANGUAGE {
            return Err(DocTranslateError::InvalidConfig(format!(
                "target language must be a concrete code, got '{}'",
                c.default_target_lang
            )));
        }
        if c.default_source_lang.is_empty() {
            return Err(DocTranslateError::InvalidConfig(
                "source language must be a code or 'auto'".into(),
            ));
        }
        if c.fallback_source_lang.is_empty() || c.fallback_source_lang == AUTO_LANGUAGE {
            return Err(DocTranslateError::InvalidConfig(format!(
                "fallback source language must be a concrete code, got '{}'",
                c.fallback_source_lang
            )));
        }
        if c.backends.request_timeout_secs == 0 {
            return Err(DocTranslateError::InvalidConfig(
                "request timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

fn normalize_code(code: String) -> String {
    code.trim().to_lowercase()
}

// ── Backend settings ─────────────────────────────────────────────────────

/// Endpoints and credentials for the HTTP translation backends.
///
/// `Debug` never prints keys or the contact e-mail.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// LibreTranslate instance. Default: `https://libretranslate.com`.
    pub libre_url: String,
    pub libre_api_key: Option<String>,
    /// Azure Translator key. Microsoft is unavailable without it.
    pub microsoft_api_key: Option<String>,
    pub microsoft_region: Option<String>,
    /// Contact e-mail sent to MyMemory for a larger free quota.
    pub mymemory_email: Option<String>,
    /// Per-HTTP-request timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            libre_url: "https://libretranslate.com".to_string(),
            libre_api_key: None,
            microsoft_api_key: None,
            microsoft_region: None,
            mymemory_email: None,
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("BackendSettings")
            .field("libre_url", &self.libre_url)
            .field("libre_api_key", &redact(&self.libre_api_key))
            .field("microsoft_api_key", &redact(&self.microsoft_api_key))
            .field("microsoft_region", &self.microsoft_region)
            .field("mymemory_email", &redact(&self.mymemory_email))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = TranslationConfig::default();
        assert_eq!(c.default_target_lang, "en");
        assert_eq!(c.default_source_lang, "auto");
        assert_eq!(c.default_backend, BackendKind::Google);
        assert_eq!(c.chunk_size, 5000);
        assert_eq!(c.chunk_delay_ms, 100);
        assert_eq!(c.batch_delay_ms, 200);
        assert_eq!(c.max_file_size, 16 * 1024 * 1024);
        assert_eq!(c.backends.request_timeout_secs, 30);
    }

    #[test]
    fn builder_normalizes_language_codes() {
        let c = TranslationConfig::builder()
            .target_lang(" HI ")
            .source_lang("Auto")
            .build()
            .unwrap();
        assert_eq!(c.default_target_lang, "hi");
        assert_eq!(c.default_source_lang, "auto");
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = TranslationConfig::builder().chunk_size(0).build().unwrap_err();
        assert!(matches!(err, DocTranslateError::InvalidConfig(_)));
    }

    #[test]
    fn auto_target_rejected() {
        assert!(TranslationConfig::builder().target_lang("auto").build().is_err());
        assert!(TranslationConfig::builder()
            .fallback_source_lang("auto")
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = TranslationConfig::builder()
            .microsoft_api_key("super-secret")
            .libre_api_key("also-secret")
            .mymemory_email("me@example.com")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(!dbg.contains("also-secret"));
        assert!(!dbg.contains("me@example.com"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn backend_settings_deserialize_with_defaults() {
        let s: BackendSettings = serde_json::from_str(r#"{"libre_url":"http://localhost:5000"}"#).unwrap();
        assert_eq!(s.libre_url, "http://localhost:5000");
        assert_eq!(s.request_timeout_secs, 30);
    }
}
