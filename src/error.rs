//! Fatal error type for the mirror run.
//!
//! Per-vocabulary problems (unreachable registry info, failed fetches,
//! unparseable payloads) are *data* and live in
//! [`VocabularyResult`](crate::pipeline::VocabularyResult); only failures
//! that invalidate the whole run surface as [`MirrorError`].

use thiserror::Error;

/// Errors that abort the entire mirror run.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The top-level registry listing could not be obtained or decoded.
    /// Without it there is nothing to mirror.
    #[error("registry listing failed: {0}")]
    Registry(String),

    /// Transport-level HTTP failure on a fatal path.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Filesystem failure while writing mirror output.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding failure for summaries or metadata records.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Invalid runtime configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}
