//! # vocmirror: a static mirror for vocabulary registries
//!
//! vocmirror turns a remote linked-data vocabulary registry into a
//! static, browsable file tree. For every vocabulary it resolves the
//! latest published file, normalizes it to canonical N-Quads, extracts
//! class and property terms, and writes per-term tiny files plus JSON
//! indexes and HTML browsing pages.
//!
//! ```text
//! registry listing ──► MirrorPipeline ──┬─► registry::resolve_latest
//!                                       ├─► store::load_meta (cache check)
//!                                       ├─► fetch::fetch_vocabulary
//!                                       ├─► format::detect ──► graph::parse
//!                                       ├─► terms::classify / summarize
//!                                       └─► store (artifacts, term files)
//!
//! all results ──► index::aggregate ──► summary.json + browsing pages
//! ```
//!
//! Processing is concurrent across vocabularies (a fixed worker pool)
//! and strictly sequential within one. Every failure mode short of a
//! missing registry listing is contained to its vocabulary and
//! recorded in the aggregate summary.
//!
//! ## Module Guide
//!
//! - [`config`] - Environment-sourced runtime configuration
//! - [`registry`] - Listing and version-resolution clients
//! - [`fetch`] - Vocabulary file download with content negotiation
//! - [`format`] - Serialization detection
//! - [`graph`] - RDF parsing and canonical serialization
//! - [`terms`] - Term classification, summaries, tiny-file extraction
//! - [`store`] - The on-disk mirror layout
//! - [`pipeline`] - Per-vocabulary state machine and worker pool
//! - [`index`] - Global and per-namespace aggregation

pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod graph;
pub mod html;
pub mod index;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod terms;
pub mod vocab;

pub use config::MirrorConfig;
pub use error::MirrorError;
pub use index::MirrorSummary;
pub use pipeline::{MirrorPipeline, VocabularyResult};
