//! Per-backend language-code overrides.
//!
//! Services disagree about a handful of languages. Sanskrit is the case that
//! matters here: LibreTranslate has no model for it, so Sanskrit is sent to
//! Libre as English rather than rejected outright.

use crate::backends::BackendKind;
use std::collections::HashMap;

/// `internal code → backend → backend code`.
///
/// Built once and shared read-only (`Arc<BackendLanguageMap>`).
#[derive(Debug, Clone)]
pub struct BackendLanguageMap {
    overrides: HashMap<String, HashMap<BackendKind, String>>,
}

impl Default for BackendLanguageMap {
    fn default() -> Self {
        Self::empty()
            .with_override("sa", BackendKind::Google, "sa")
            .with_override("sa", BackendKind::Microsoft, "sa")
            .with_override("sa", BackendKind::Libre, "en")
            .with_override("sa", BackendKind::MyMemory, "sa")
    }
}

impl BackendLanguageMap {
    /// A map with no overrides; every code maps to itself.
    pub fn empty() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(
        mut self,
        code: impl Into<String>,
        backend: BackendKind,
        backend_code: impl Into<String>,
    ) -> Self {
        self.overrides
            .entry(code.into())
            .or_default()
            .insert(backend, backend_code.into());
        self
    }

    /// The code `backend` expects for `code`.
    pub fn map_code<'a>(&'a self, code: &'a str, backend: BackendKind) -> &'a str {
        self.overrides
            .get(code)
            .and_then(|per_backend| per_backend.get(&backend))
            .map(String::as_str)
            .unwrap_or(code)
    }
}
