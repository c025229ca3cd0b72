//! The vocabulary mirror pipeline.
//!
//! Per vocabulary: resolve latest version → cache check → fetch →
//! detect + parse → term extraction → persistence. Each vocabulary is
//! fully independent; a fixed pool of workers claims entries off a
//! shared index counter and failures never propagate past their item.
//! The only fatal path is the registry listing itself.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::fetch::{self, FetchOutcome};
use crate::format::{self, Detection, RdfSerialization};
use crate::graph;
use crate::html;
use crate::index::{self, MirrorSummary};
use crate::registry::{RegistryClient, VersionInfo, VocabularyEntry};
use crate::store::{MirrorStore, TermKind, VocabularyMeta};
use crate::terms::{self, Classified, TermSummary};

/// HTTP-like status recorded when a payload fetched fine but could not
/// be converted; distinguishes "fetched but unusable" from "fetch
/// failed".
pub const CONVERSION_FAILED_STATUS: u16 = 422;

/// Per-vocabulary outcome record aggregated into the global index.
#[derive(Debug, Clone, Serialize)]
pub struct VocabularyResult {
    pub prefix: String,
    pub canonical_uri: String,
    pub namespace: Option<String>,
    pub version: Option<VersionInfo>,
    pub ok: bool,
    /// True when no usable version could be resolved.
    pub skipped: bool,
    /// True when the persisted artifact was reused untouched.
    pub cached: bool,
    /// HTTP status of the fetch, [`CONVERSION_FAILED_STATUS`] on
    /// conversion failure, 0 before any response was seen.
    pub status_code: u16,
    /// True when the serialization was guessed rather than matched.
    pub format_guessed: bool,
    pub note: Option<String>,
    pub class_terms: Vec<TermSummary>,
    pub property_terms: Vec<TermSummary>,
}

impl VocabularyResult {
    fn for_entry(entry: &VocabularyEntry) -> Self {
        Self {
            prefix: entry.prefix.clone(),
            canonical_uri: entry.canonical_uri.clone(),
            namespace: entry.namespace.clone(),
            version: None,
            ok: false,
            skipped: false,
            cached: false,
            status_code: 0,
            format_guessed: false,
            note: None,
            class_terms: Vec::new(),
            property_terms: Vec::new(),
        }
    }
}

/// Term IRIs already claimed for writing during this run. Consulted
/// under a lock so two workers discovering the same IRI concurrently
/// produce exactly one write (first sighting wins).
#[derive(Debug, Default)]
struct TermLedger {
    classes: HashSet<String>,
    properties: HashSet<String>,
}

impl TermLedger {
    /// Claims an IRI; returns false if already claimed this run.
    fn claim(&mut self, kind: TermKind, iri: &str) -> bool {
        let set = match kind {
            TermKind::Class => &mut self.classes,
            TermKind::Property => &mut self.properties,
        };
        set.insert(iri.to_string())
    }
}

/// Orchestrates one full mirror run.
#[derive(Debug, Clone)]
pub struct MirrorPipeline {
    config: MirrorConfig,
    client: Client,
    registry: RegistryClient,
    store: MirrorStore,
}

impl MirrorPipeline {
    pub fn new(config: MirrorConfig) -> Result<Self, MirrorError> {
        let client = Client::builder()
            .user_agent(concat!("vocmirror/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let registry = RegistryClient::new(client.clone(), config.registry_base.clone());
        let store = MirrorStore::new(&config.output_root);
        Ok(Self {
            config,
            client,
            registry,
            store,
        })
    }

    pub fn store(&self) -> &MirrorStore {
        &self.store
    }

    /// Runs the pipeline over the full vocabulary listing and writes
    /// the aggregate index.
    pub async fn run(&self) -> Result<MirrorSummary, MirrorError> {
        let started = Instant::now();
        let entries = Arc::new(self.registry.list().await?);
        info!(count = entries.len(), "registry listing loaded");

        let next = Arc::new(AtomicUsize::new(0));
        let results = Arc::new(Mutex::new(Vec::with_capacity(entries.len())));
        let ledger = Arc::new(Mutex::new(TermLedger::default()));

        let workers = self.config.workers.max(1);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let pipeline = self.clone();
            let entries = Arc::clone(&entries);
            let next = Arc::clone(&next);
            let results = Arc::clone(&results);
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(entry) = entries.get(index) else {
                        break;
                    };
                    let result = pipeline.process_vocabulary(entry, &ledger).await;
                    results.lock().await.push(result);
                }
                debug!(worker_id, "worker drained the queue");
            }));
        }
        for handle in handles {
            handle
                .await
                .map_err(|err| MirrorError::Worker(err.to_string()))?;
        }

        let results = {
            let mut guard = results.lock().await;
            std::mem::take(&mut *guard)
        };
        let summary = index::aggregate(&self.store, results).await?;
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mirror run complete"
        );
        Ok(summary)
    }

    /// Processes one vocabulary end to end. Never returns an error;
    /// every failure mode lands in the result record.
    async fn process_vocabulary(
        &self,
        entry: &VocabularyEntry,
        ledger: &Mutex<TermLedger>,
    ) -> VocabularyResult {
        let mut result = VocabularyResult::for_entry(entry);

        let Some(version) = self.registry.resolve_latest(&entry.prefix).await else {
            result.skipped = true;
            result.note = Some("no usable published version".to_string());
            warn!(prefix = %entry.prefix, "skipping: no usable published version");
            return result;
        };
        result.version = Some(version.clone());

        // Cache contract: reuse only when the artifact is present, the
        // resolved (fileURL, issued) pair matches the last record
        // exactly and that attempt converted.
        if let Some(meta) = self.store.load_meta(&entry.prefix).await {
            if meta.converted
                && meta.version.as_ref() == Some(&version)
                && self.store.artifact_exists(&entry.prefix).await
            {
                debug!(prefix = %entry.prefix, "cache hit; reusing persisted artifacts");
                result.ok = true;
                result.cached = true;
                result.status_code = meta.http_status;
                result.format_guessed = meta.format_guessed;
                result.class_terms = meta.class_terms;
                result.property_terms = meta.property_terms;
                return result;
            }
        }

        let outcome =
            fetch::fetch_vocabulary(&self.client, &version.file_url, self.config.fetch_timeout)
                .await;
        result.status_code = outcome.http_status;
        if !outcome.succeeded {
            result.note = Some(
                outcome
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "fetch failed".to_string()),
            );
            warn!(
                prefix = %entry.prefix,
                status = outcome.http_status,
                note = result.note.as_deref().unwrap_or(""),
                "fetch failed"
            );
            self.record_failure(entry, &version, &outcome, None, false, &result)
                .await;
            return result;
        }
        let body = outcome.body.as_deref().unwrap_or_default();

        let detection =
            format::detect(outcome.declared_content_type.as_deref(), &outcome.resolved_url);
        let (kind, guessed) = match detection {
            Detection::Matched(kind) => (kind, false),
            Detection::Guessed(kind) => {
                debug!(
                    prefix = %entry.prefix,
                    kind = kind.name(),
                    "detection inconclusive; parsing as a guess"
                );
                (kind, true)
            }
            Detection::Unsupported { reason } => {
                warn!(prefix = %entry.prefix, %reason, "unsupported serialization");
                result.note = Some(reason);
                self.record_failure(entry, &version, &outcome, None, false, &result)
                    .await;
                return result;
            }
        };
        result.format_guessed = guessed;

        let dataset = match graph::parse(body, kind, &entry.canonical_uri) {
            Ok(dataset) => dataset,
            Err(err) => {
                result.status_code = CONVERSION_FAILED_STATUS;
                result.note = Some(err.to_string());
                warn!(prefix = %entry.prefix, error = %err, guessed, "conversion failed");
                self.record_failure(entry, &version, &outcome, Some(kind), guessed, &result)
                    .await;
                return result;
            }
        };

        let classified = terms::classify(&dataset);
        let class_terms: Vec<TermSummary> = classified
            .classes
            .iter()
            .map(|iri| terms::summarize(&dataset, iri))
            .collect();
        let property_terms: Vec<TermSummary> = classified
            .properties
            .iter()
            .map(|iri| terms::summarize(&dataset, iri))
            .collect();

        if let Err(err) = self.persist_term_files(ledger, &dataset, &classified).await {
            result.note = Some(format!("term persistence failed: {err}"));
            warn!(prefix = %entry.prefix, error = %err, "term persistence failed");
            return result;
        }

        let meta = VocabularyMeta {
            prefix: entry.prefix.clone(),
            canonical_uri: entry.canonical_uri.clone(),
            namespace: entry.namespace.clone(),
            version: Some(version.clone()),
            fetched_at: Some(outcome.fetched_at),
            http_status: outcome.http_status,
            declared_content_type: outcome.declared_content_type.clone(),
            resolved_url: Some(outcome.resolved_url.clone()),
            serialization: Some(kind.name().to_string()),
            format_guessed: guessed,
            converted: true,
            error: None,
            class_terms: class_terms.clone(),
            property_terms: property_terms.clone(),
        };
        let artifact = graph::serialize(&dataset);
        let page = html::vocabulary_page(&meta);
        if let Err(err) = self.store.persist_vocabulary(&meta, &artifact, &page).await {
            result.note = Some(format!("persistence failed: {err}"));
            warn!(prefix = %entry.prefix, error = %err, "persistence failed");
            return result;
        }

        info!(
            prefix = %entry.prefix,
            classes = class_terms.len(),
            properties = property_terms.len(),
            quads = dataset.len(),
            "vocabulary mirrored"
        );
        result.ok = true;
        result.class_terms = class_terms;
        result.property_terms = property_terms;
        result
    }

    /// Writes one tiny file per newly-discovered term. IRIs claimed in
    /// the shared ledger first, then skipped when the file already
    /// exists from an earlier run; empty extractions write nothing.
    async fn persist_term_files(
        &self,
        ledger: &Mutex<TermLedger>,
        dataset: &oxrdf::Dataset,
        classified: &Classified,
    ) -> Result<(), MirrorError> {
        let groups = [
            (TermKind::Class, &classified.classes),
            (TermKind::Property, &classified.properties),
        ];
        for (kind, iris) in groups {
            for iri in iris {
                {
                    let mut guard = ledger.lock().await;
                    if !guard.claim(kind, iri) {
                        continue;
                    }
                }
                if self.store.term_file_exists(kind, iri).await {
                    continue;
                }
                let quads = terms::extract_term_quads(dataset, iri);
                if quads.is_empty() {
                    continue;
                }
                self.store
                    .write_term_file(kind, iri, &graph::serialize_quads(&quads))
                    .await?;
            }
        }
        Ok(())
    }

    /// Records a failed attempt in the metadata record so the next run
    /// retries instead of reusing the cache. The artifact, if one
    /// exists from an earlier success, is left untouched.
    async fn record_failure(
        &self,
        entry: &VocabularyEntry,
        version: &VersionInfo,
        outcome: &FetchOutcome,
        kind: Option<RdfSerialization>,
        guessed: bool,
        result: &VocabularyResult,
    ) {
        let meta = VocabularyMeta {
            prefix: entry.prefix.clone(),
            canonical_uri: entry.canonical_uri.clone(),
            namespace: entry.namespace.clone(),
            version: Some(version.clone()),
            fetched_at: Some(outcome.fetched_at),
            http_status: result.status_code,
            declared_content_type: outcome.declared_content_type.clone(),
            resolved_url: Some(outcome.resolved_url.clone()),
            serialization: kind.map(|kind| kind.name().to_string()),
            format_guessed: guessed,
            converted: false,
            error: result.note.clone(),
            class_terms: Vec::new(),
            property_terms: Vec::new(),
        };
        if let Err(err) = self.store.persist_failure(&meta).await {
            warn!(prefix = %entry.prefix, error = %err, "could not record failure metadata");
        }
    }
}
