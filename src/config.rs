//! Environment-sourced runtime configuration.
//!
//! All knobs have documented defaults so the binary runs with no setup:
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `VOCMIRROR_OUTPUT_DIR` | `vocab-mirror` | root of the mirror tree |
//! | `VOCMIRROR_WORKERS` | `8` | concurrent vocabulary workers |
//! | `VOCMIRROR_REGISTRY` | the LOV endpoint | registry base URL |
//! | `VOCMIRROR_FETCH_TIMEOUT_SECS` | `30` | per-fetch deadline |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::MirrorError;

/// Runtime configuration for one mirror run.
#[derive(Clone, Debug)]
pub struct MirrorConfig {
    /// Root directory of the produced mirror tree.
    pub output_root: PathBuf,
    /// Number of concurrent vocabulary workers.
    pub workers: usize,
    /// Base URL of the vocabulary registry.
    pub registry_base: Url,
    /// Wall-clock budget for a single vocabulary fetch.
    pub fetch_timeout: Duration,
}

impl MirrorConfig {
    pub const DEFAULT_OUTPUT_DIR: &'static str = "vocab-mirror";
    pub const DEFAULT_WORKERS: usize = 8;
    pub const DEFAULT_REGISTRY: &'static str = "https://lov.linkeddata.es/dataset/lov";
    pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

    /// Builds a configuration from the environment, falling back to the
    /// documented defaults. Reads a `.env` file when present.
    pub fn from_env() -> Result<Self, MirrorError> {
        dotenvy::dotenv().ok();

        let output_root = std::env::var("VOCMIRROR_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_OUTPUT_DIR));

        let workers = std::env::var("VOCMIRROR_WORKERS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|workers| *workers > 0)
            .unwrap_or(Self::DEFAULT_WORKERS);

        let registry_raw = std::env::var("VOCMIRROR_REGISTRY")
            .unwrap_or_else(|_| Self::DEFAULT_REGISTRY.to_string());
        let registry_base = Url::parse(&registry_raw).map_err(|err| {
            MirrorError::Config(format!("VOCMIRROR_REGISTRY is not a valid URL: {err}"))
        })?;

        let fetch_timeout = std::env::var("VOCMIRROR_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(Self::DEFAULT_FETCH_TIMEOUT_SECS));

        Ok(Self {
            output_root,
            workers,
            registry_base,
            fetch_timeout,
        })
    }

    /// Creates a configuration with explicit values (used by tests and
    /// embedders; `from_env` is the binary's path).
    pub fn new(output_root: impl Into<PathBuf>, registry_base: Url) -> Self {
        Self {
            output_root: output_root.into(),
            workers: Self::DEFAULT_WORKERS,
            registry_base,
            fetch_timeout: Duration::from_secs(Self::DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}
