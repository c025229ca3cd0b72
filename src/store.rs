//! The on-disk mirror layout.
//!
//! ```text
//! <root>/
//!   by-prefix/<enc prefix>/vocabulary.nq | meta.json | index.html
//!   by-uri/<enc uri>/...            (same content, second address)
//!   classes/<enc iri>.nq            one tiny file per class term
//!   properties/<enc iri>.nq        one tiny file per property term
//!   namespaces/<enc ns>/summary.json | index.html
//!   summary.json | index.html
//! ```
//!
//! File names derive from a reversible percent-encoding of the key, so
//! any IRI or prefix can be mapped back from its file name.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::MirrorError;
use crate::registry::VersionInfo;
use crate::terms::TermSummary;

/// Everything percent-encoded except characters safe in file names.
const FILE_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

const ARTIFACT_FILE: &str = "vocabulary.nq";
const META_FILE: &str = "meta.json";
const PAGE_FILE: &str = "index.html";

/// Which tiny-file subtree a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Class,
    Property,
}

impl TermKind {
    fn dir_name(&self) -> &'static str {
        match self {
            TermKind::Class => "classes",
            TermKind::Property => "properties",
        }
    }
}

/// Per-vocabulary metadata record, written beside the artifact and
/// consulted on later runs for the cache/idempotence contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyMeta {
    pub prefix: String,
    pub canonical_uri: String,
    pub namespace: Option<String>,
    pub version: Option<VersionInfo>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub http_status: u16,
    pub declared_content_type: Option<String>,
    pub resolved_url: Option<String>,
    /// Name of the serialization the payload was parsed as.
    pub serialization: Option<String>,
    /// True when the serialization was guessed rather than matched.
    pub format_guessed: bool,
    /// True only when parse and conversion completed.
    pub converted: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub class_terms: Vec<TermSummary>,
    #[serde(default)]
    pub property_terms: Vec<TermSummary>,
}

/// Filesystem access for the mirror tree.
#[derive(Debug, Clone)]
pub struct MirrorStore {
    root: PathBuf,
}

impl MirrorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reversible file-name encoding for prefixes, URIs and IRIs.
    pub fn encode_key(key: &str) -> String {
        utf8_percent_encode(key, FILE_NAME_SET).to_string()
    }

    /// Inverse of [`encode_key`](Self::encode_key).
    pub fn decode_key(encoded: &str) -> String {
        percent_decode_str(encoded).decode_utf8_lossy().into_owned()
    }

    pub fn prefix_dir(&self, prefix: &str) -> PathBuf {
        self.root.join("by-prefix").join(Self::encode_key(prefix))
    }

    pub fn uri_dir(&self, uri: &str) -> PathBuf {
        self.root.join("by-uri").join(Self::encode_key(uri))
    }

    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join("namespaces").join(Self::encode_key(namespace))
    }

    pub fn term_file(&self, kind: TermKind, iri: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.nq", Self::encode_key(iri)))
    }

    /// Loads the metadata record persisted for a prefix, if any.
    /// Unreadable or undecodable records count as absent; the caller
    /// falls back to a full re-fetch.
    pub async fn load_meta(&self, prefix: &str) -> Option<VocabularyMeta> {
        let path = self.prefix_dir(prefix).join(META_FILE);
        let data = fs::read_to_string(&path).await.ok()?;
        serde_json::from_str(&data).ok()
    }

    /// True when the prefix-keyed artifact is present on disk.
    pub async fn artifact_exists(&self, prefix: &str) -> bool {
        fs::try_exists(self.prefix_dir(prefix).join(ARTIFACT_FILE))
            .await
            .unwrap_or(false)
    }

    /// Writes artifact, metadata record and browsing page under both
    /// the prefix-keyed and URI-keyed locations.
    pub async fn persist_vocabulary(
        &self,
        meta: &VocabularyMeta,
        artifact: &str,
        page: &str,
    ) -> Result<(), MirrorError> {
        let encoded_meta = serde_json::to_string_pretty(meta)?;
        for dir in [
            self.prefix_dir(&meta.prefix),
            self.uri_dir(&meta.canonical_uri),
        ] {
            fs::create_dir_all(&dir).await?;
            fs::write(dir.join(ARTIFACT_FILE), artifact).await?;
            fs::write(dir.join(META_FILE), &encoded_meta).await?;
            fs::write(dir.join(PAGE_FILE), page).await?;
        }
        Ok(())
    }

    /// Records a failed attempt. The artifact (if any) is left
    /// untouched; only the metadata record changes, which is what
    /// forces the next run to retry instead of reusing the cache.
    pub async fn persist_failure(&self, meta: &VocabularyMeta) -> Result<(), MirrorError> {
        let encoded_meta = serde_json::to_string_pretty(meta)?;
        for dir in [
            self.prefix_dir(&meta.prefix),
            self.uri_dir(&meta.canonical_uri),
        ] {
            fs::create_dir_all(&dir).await?;
            fs::write(dir.join(META_FILE), &encoded_meta).await?;
        }
        Ok(())
    }

    pub async fn term_file_exists(&self, kind: TermKind, iri: &str) -> bool {
        fs::try_exists(self.term_file(kind, iri))
            .await
            .unwrap_or(false)
    }

    pub async fn write_term_file(
        &self,
        kind: TermKind,
        iri: &str,
        content: &str,
    ) -> Result<(), MirrorError> {
        let path = self.term_file(kind, iri);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;
        Ok(())
    }

    /// Writes one namespace group's summary pair.
    pub async fn write_namespace_summary(
        &self,
        namespace: &str,
        summary_json: &str,
        page: &str,
    ) -> Result<(), MirrorError> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join("summary.json"), summary_json).await?;
        fs::write(dir.join(PAGE_FILE), page).await?;
        Ok(())
    }

    /// Writes the root summary pair.
    pub async fn write_global_summary(
        &self,
        summary_json: &str,
        page: &str,
    ) -> Result<(), MirrorError> {
        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join("summary.json"), summary_json).await?;
        fs::write(self.root.join(PAGE_FILE), page).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn key_encoding_is_reversible() {
        let keys = [
            "ex",
            "http://example.org/ex#",
            "http://example.org/path?q=1&x=2",
            "has space/slash",
        ];
        for key in keys {
            let encoded = MirrorStore::encode_key(key);
            assert!(
                !encoded.contains('/') && !encoded.contains('#'),
                "no path-hostile characters in {encoded}"
            );
            assert_eq!(MirrorStore::decode_key(&encoded), key, "key {key}");
        }
    }

    #[test]
    fn term_files_land_in_their_kind_subtree() {
        let store = MirrorStore::new("mirror");
        let class = store.term_file(TermKind::Class, "http://example.org/ex#Thing");
        let property = store.term_file(TermKind::Property, "http://example.org/ex#hasPart");
        assert!(class.starts_with("mirror/classes"));
        assert!(property.starts_with("mirror/properties"));
        assert!(class.to_string_lossy().ends_with(".nq"));
    }

    fn sample_meta() -> VocabularyMeta {
        VocabularyMeta {
            prefix: "ex".to_string(),
            canonical_uri: "http://example.org/ex#".to_string(),
            namespace: Some("http://example.org/ex#".to_string()),
            version: Some(VersionInfo {
                file_url: "http://example.org/files/ex.ttl".to_string(),
                issued_at: "2023-01-01T00:00:00Z".parse().unwrap(),
            }),
            fetched_at: None,
            http_status: 200,
            declared_content_type: Some("text/turtle".to_string()),
            resolved_url: Some("http://example.org/files/ex.ttl".to_string()),
            serialization: Some("Turtle".to_string()),
            format_guessed: false,
            converted: true,
            error: None,
            class_terms: Vec::new(),
            property_terms: Vec::new(),
        }
    }

    #[tokio::test]
    async fn meta_roundtrips_through_the_prefix_location() {
        let dir = tempdir().unwrap();
        let store = MirrorStore::new(dir.path());
        let meta = sample_meta();
        store
            .persist_vocabulary(&meta, "<a> <b> <c> .\n", "<html></html>")
            .await
            .unwrap();

        let loaded = store.load_meta("ex").await.expect("meta should load");
        assert_eq!(loaded.prefix, "ex");
        assert_eq!(loaded.version, meta.version);
        assert!(loaded.converted);

        // Both addresses carry the artifact.
        let by_uri = store
            .uri_dir("http://example.org/ex#")
            .join(super::ARTIFACT_FILE);
        assert!(fs::try_exists(by_uri).await.unwrap());
    }

    #[tokio::test]
    async fn load_meta_is_none_for_unknown_prefixes() {
        let dir = tempdir().unwrap();
        let store = MirrorStore::new(dir.path());
        assert!(store.load_meta("missing").await.is_none());
    }
}
