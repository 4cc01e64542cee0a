//! Progress-callback trait for translation events.
//!
//! Inject an `Arc<dyn TranslationProgressCallback>` via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to follow a
//! request as it moves chunk by chunk through the failover chain. The CLI
//! drives its progress bar this way.
//!
//! # Example
//!
//! ```rust
//! use doctranslate::{BackendKind, TranslationConfig, TranslationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ChunkCounter(AtomicUsize);
//!
//! impl TranslationProgressCallback for ChunkCounter {
//!     fn on_chunk_complete(&self, _backend: BackendKind, chunk: usize, total: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("chunk {chunk}/{total}");
//!     }
//! }
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(Arc::new(ChunkCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::backends::BackendKind;
use std::sync::Arc;

/// Called by the orchestrator while it translates a text.
///
/// All methods default to no-ops. A failed backend restarts the chunk count,
/// so `on_chunk_complete` can report chunk 1 more than once per request.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once the text has been chunked, before any backend is called.
    ///
    /// # Arguments
    /// * `total_chunks` - number of chunks every backend will have to translate
    fn on_translation_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called when a backend from the failover chain is tried.
    ///
    /// # Arguments
    /// * `backend` - the backend about to receive chunk 1
    /// * `attempt` - 1-indexed position in the failover chain
    fn on_backend_start(&self, backend: BackendKind, attempt: usize) {
        let _ = (backend, attempt);
    }

    /// Called after a chunk has been translated.
    ///
    /// # Arguments
    /// * `backend`      - backend that translated it
    /// * `chunk`        - 1-indexed chunk number
    /// * `total_chunks` - chunks in the text
    fn on_chunk_complete(&self, backend: BackendKind, chunk: usize, total_chunks: usize) {
        let _ = (backend, chunk, total_chunks);
    }

    /// Called when a backend is abandoned.
    ///
    /// # Arguments
    /// * `backend` - the abandoned backend
    /// * `chunk`   - 1-indexed chunk it failed on
    /// * `error`   - human-readable error description
    fn on_backend_failed(&self, backend: BackendKind, chunk: usize, error: &str) {
        let _ = (backend, chunk, error);
    }

    /// Called once when the request ends.
    ///
    /// # Arguments
    /// * `backend` - the backend that succeeded; `None` when translation was
    ///   skipped (same language) or every backend failed
    /// * `success` - whether a translation was produced
    fn on_translation_complete(&self, backend: Option<BackendKind>, success: bool) {
        let _ = (backend, success);
    }
}

/// Default callback when none is configured.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl TranslationProgressCallback for Recorder {
        fn on_translation_start(&self, total_chunks: usize) {
            self.events.lock().unwrap().push(format!("start:{total_chunks}"));
        }

        fn on_backend_start(&self, backend: BackendKind, attempt: usize) {
            self.events.lock().unwrap().push(format!("try:{backend}:{attempt}"));
        }

        fn on_chunk_complete(&self, backend: BackendKind, chunk: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("chunk:{backend}:{chunk}/{total}"));
        }

        fn on_backend_failed(&self, backend: BackendKind, chunk: usize, _error: &str) {
            self.events.lock().unwrap().push(format!("fail:{backend}:{chunk}"));
        }

        fn on_translation_complete(&self, backend: Option<BackendKind>, success: bool) {
            let name = backend.map(|b| b.to_string()).unwrap_or_default();
            self.events.lock().unwrap().push(format!("done:{name}:{success}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_translation_start(3);
        cb.on_backend_start(BackendKind::Google, 1);
        cb.on_chunk_complete(BackendKind::Google, 1, 3);
        cb.on_backend_failed(BackendKind::Google, 2, "timeout");
        cb.on_translation_complete(None, false);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_translation_start(2);
        rec.on_backend_start(BackendKind::Libre, 1);
        rec.on_backend_failed(BackendKind::Libre, 1, "HTTP 500");
        rec.on_backend_start(BackendKind::Google, 2);
        rec.on_chunk_complete(BackendKind::Google, 1, 2);
        rec.on_chunk_complete(BackendKind::Google, 2, 2);
        rec.on_translation_complete(Some(BackendKind::Google), true);

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start:2",
                "try:libre:1",
                "fail:libre:1",
                "try:google:2",
                "chunk:google:1/2",
                "chunk:google:2/2",
                "done:google:true",
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_translation_start(1);
        cb.on_translation_complete(Some(BackendKind::MyMemory), true);
    }
}
