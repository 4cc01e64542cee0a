//! Translation backends.
//!
//! Every external service sits behind one capability,
//! [`TranslationBackend::translate`]. The orchestrator never knows which
//! service it is talking to; it asks the [`BackendRegistry`] for the
//! implementation registered under a [`BackendKind`] and calls it.
//!
//! | Kind | Service | Needs credentials |
//! |------|---------|-------------------|
//! | `google`    | translate.googleapis.com (`client=gtx`) | no |
//! | `microsoft` | Azure Translator v3                      | API key |
//! | `libre`     | LibreTranslate (any instance)            | optional API key |
//! | `mymemory`  | api.mymemory.translated.net              | optional e-mail |
//!
//! Tests and embedders can register their own implementations with
//! [`BackendRegistry::register`], which is how the failover logic is exercised
//! without network access.

pub mod google;
pub mod libre;
pub mod microsoft;
pub mod mymemory;

use crate::config::BackendSettings;
use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use google::GoogleBackend;
pub use libre::LibreBackend;
pub use microsoft::MicrosoftBackend;
pub use mymemory::MyMemoryBackend;

/// The closed set of translation services the orchestrator can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Google,
    Microsoft,
    Libre,
    MyMemory,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Google,
        BackendKind::Microsoft,
        BackendKind::Libre,
        BackendKind::MyMemory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Google => "google",
            BackendKind::Microsoft => "microsoft",
            BackendKind::Libre => "libre",
            BackendKind::MyMemory => "mymemory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(BackendKind::Google),
            "microsoft" => Ok(BackendKind::Microsoft),
            "libre" | "libretranslate" => Ok(BackendKind::Libre),
            "mymemory" => Ok(BackendKind::MyMemory),
            other => Err(format!(
                "unknown backend '{other}' (expected google, microsoft, libre or mymemory)"
            )),
        }
    }
}

/// A translation service.
///
/// Implementations must be `Send + Sync` so a registry can be shared behind an
/// `Arc`. Language codes arrive already mapped for this backend by
/// [`crate::pipeline::langmap::BackendLanguageMap`].
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Which registry slot this implementation serves.
    fn kind(&self) -> BackendKind;

    /// Translate `text` from `source` to `target`.
    ///
    /// An empty `Ok` string is allowed; the orchestrator substitutes the
    /// original chunk for it.
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, BackendError>;
}

/// Lookup table from [`BackendKind`] to implementation.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Arc<dyn TranslationBackend>>,
}

impl BackendRegistry {
    /// An empty registry; every lookup fails with `NotConfigured`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the HTTP backends described by `settings`.
    ///
    /// Microsoft is only registered when an API key is present; the other
    /// three services accept anonymous requests.
    pub fn from_settings(settings: &BackendSettings) -> Self {
        let client = http_client(settings.request_timeout_secs);
        let mut registry = Self::empty();

        registry.register(Arc::new(GoogleBackend::new(client.clone())));
        registry.register(Arc::new(LibreBackend::new(
            client.clone(),
            settings.libre_url.clone(),
            settings.libre_api_key.clone(),
        )));
        registry.register(Arc::new(MyMemoryBackend::new(
            client.clone(),
            settings.mymemory_email.clone(),
        )));

        match settings.microsoft_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                registry.register(Arc::new(MicrosoftBackend::new(
                    client,
                    key.to_string(),
                    settings.microsoft_region.clone(),
                )));
            }
            _ => debug!("Microsoft Translator not registered: no API key"),
        }

        registry
    }

    /// Register (or replace) the implementation for `backend.kind()`.
    pub fn register(&mut self, backend: Arc<dyn TranslationBackend>) -> &mut Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.register(backend);
        self
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn TranslationBackend>> {
        self.backends.get(&kind).cloned()
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Registered kinds in [`BackendKind::ALL`] order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|k| self.backends.contains_key(k))
            .collect()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.kinds())
            .finish()
    }
}

/// Shared HTTP client with a per-request timeout.
///
/// A default client is used as a last resort if the builder fails.
fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("doctranslate/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a non-success HTTP response to a [`BackendError`].
pub(crate) async fn status_error(backend: BackendKind, response: reqwest::Response) -> BackendError {
    let status = response.status();
    if status.as_u16() == 429 {
        return BackendError::RateLimited { backend };
    }
    let body = response.text().await.unwrap_or_default();
    BackendError::Http {
        status: status.as_u16(),
        body: truncate_body(&body),
    }
}

/// Keep error bodies short enough for a log line.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.trim().to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{}\u{2026}", cut.trim())
    }
}
