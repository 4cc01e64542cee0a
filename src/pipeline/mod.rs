//! Pipeline stages for document translation.
//!
//! Each submodule implements one step, so each can be tested on its own and
//! swapped (a different language identifier, a different backend set)
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ detect ──▶ chunk ──▶ translate ──▶ render
//! (checks)  (pdf/docx/txt) (lang)  (words)   (failover)    (pdf/txt)
//! ```
//!
//! 1. [`input`]     validate size and extension, describe the upload
//! 2. [`extract`]   dispatch to [`pdf`], [`docx`] or plain-text decoding;
//!    CPU-bound, so callers run it in `spawn_blocking`
//! 3. [`detect`]    identify the source language when it is `auto`
//! 4. [`chunk`]     split text on word boundaries for backend size limits
//! 5. [`translate`] drive backends in failover order; the only stage with
//!    network I/O. [`langmap`] rewrites codes a backend does not accept.
//! 6. [`render`]    build the downloadable PDF or text artifact

pub mod chunk;
pub mod detect;
pub mod docx;
pub mod extract;
pub mod input;
pub mod langmap;
pub mod pdf;
pub mod render;
pub mod translate;
