// ── Core error types ──
//
// Failures the core can surface. None of them are shown to users raw:
// the sync controller and the error boundaries log the technical detail
// and convert it into a short `Notice`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Filtering pipeline ───────────────────────────────────────────
    #[error("filter worker unavailable: {reason}")]
    WorkerUnavailable { reason: String },

    #[error("filter worker timed out after {timeout_ms}ms")]
    WorkerTimeout { timeout_ms: u64 },

    #[error("filter worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("filter pipeline failed: {message}")]
    Pipeline { message: String },

    // ── Rendering ────────────────────────────────────────────────────
    #[error("render failed in {section}: {message}")]
    Render { section: String, message: String },

    #[error("view node missing: {node}")]
    MissingViewNode { node: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("invalid date: {input}")]
    InvalidDate { input: String },
}

impl CoreError {
    pub fn render(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            section: section.into(),
            message: message.into(),
        }
    }
}
