//! One-line-per-request translation log.
//!
//! Every request produces exactly one [`LogEntry`], emitted through `tracing`
//! and, when a log file is configured, appended to it. Lines are never
//! rewritten. A log file that cannot be written is reported as a warning and
//! does not fail the request.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// One translation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub filename: String,
    pub source_lang: String,
    pub target_lang: String,
    pub success: bool,
    pub error: Option<String>,
}

impl fmt::Display for LogEntry {
    /// `2025-01-31 14:02:11 | SUCCESS | notes.pdf | hi→en[ | Error: …]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}\u{2192}{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            if self.success { "SUCCESS" } else { "FAILED" },
            self.filename,
            self.source_lang,
            self.target_lang
        )?;
        if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            write!(f, " | Error: {error}")?;
        }
        Ok(())
    }
}

/// Append-only sink for [`LogEntry`] lines.
#[derive(Debug, Default)]
pub struct TranslationLog {
    path: Option<PathBuf>,
    // Serialises appends from concurrent requests.
    write_lock: Mutex<()>,
}

impl TranslationLog {
    /// Log through `tracing` only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also append every line to `path`.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record one request and return the entry that was written.
    pub fn log_translation(
        &self,
        filename: &str,
        source_lang: &str,
        target_lang: &str,
        success: bool,
        error: Option<&str>,
    ) -> LogEntry {
        let entry = LogEntry {
            timestamp: Local::now(),
            filename: filename.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            success,
            error: error.map(str::to_string),
        };
        self.append(&entry);
        entry
    }

    pub fn append(&self, entry: &LogEntry) {
        let line = entry.to_string();
        info!("{}", line);

        let Some(path) = &self.path else {
            return;
        };
        // A poisoned lock only means another append panicked; the file is still usable.
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = result {
            warn!("Could not write to log file {}: {}", path.display(), e);
        }
    }
}
