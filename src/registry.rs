//! Registry clients: the vocabulary listing and per-vocabulary
//! version resolution.
//!
//! Registry payload field names vary between deployments, so
//! descriptor fields resolve through small fallback-key chains rather
//! than rigid serde structs. The listing call is the run's only fatal
//! network dependency; everything after it degrades per vocabulary.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::error::MirrorError;

/// One vocabulary from the registry listing. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    /// Unique registry key.
    pub prefix: String,
    /// Canonical vocabulary URI, also the parse base.
    pub canonical_uri: String,
    /// Declared namespace, if any.
    pub namespace: Option<String>,
}

/// A published vocabulary file location with its issuance timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub file_url: String,
    pub issued_at: DateTime<Utc>,
}

/// Thin client over the registry's listing and info APIs.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base: Url,
}

impl RegistryClient {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// Fetches the full vocabulary listing.
    ///
    /// This is the only fatal call in the system: without the listing
    /// there is nothing to mirror, so any failure here aborts the run.
    pub async fn list(&self) -> Result<Vec<VocabularyEntry>, MirrorError> {
        let url = self.endpoint("api/v2/vocabulary/list");
        let value: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| MirrorError::Registry(err.to_string()))?
            .error_for_status()
            .map_err(|err| MirrorError::Registry(err.to_string()))?
            .json()
            .await
            .map_err(|err| MirrorError::Registry(err.to_string()))?;

        let items = value
            .as_array()
            .ok_or_else(|| MirrorError::Registry("listing is not a JSON array".to_string()))?;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let Some(prefix) = string_field(item, &["prefix", "vocab"]) else {
                continue;
            };
            let Some(canonical_uri) = string_field(item, &["uri"]) else {
                continue;
            };
            entries.push(VocabularyEntry {
                prefix,
                canonical_uri,
                namespace: string_field(item, &["nsp", "namespace"]),
            });
        }
        Ok(entries)
    }

    /// Resolves the most recently issued usable version of a vocabulary.
    ///
    /// Versions without a file location or a parseable timestamp are
    /// discarded. Returns `None` when nothing usable remains or the
    /// registry call itself fails; both are skip reasons, never fatal.
    ///
    /// When several versions share the maximum timestamp the first one
    /// in registry response order wins; the ordering is
    /// registry-dependent and the resulting non-determinism is
    /// accepted rather than papered over.
    pub async fn resolve_latest(&self, prefix: &str) -> Option<VersionInfo> {
        let url = self.endpoint(&format!("api/v2/vocabulary/info?vocab={prefix}"));
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(prefix, error = %err, "registry info request failed");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                warn!(prefix, error = %err, "registry info returned an error status");
                return None;
            }
        };
        let value: Value = match response.json().await {
            Ok(value) => value,
            Err(err) => {
                warn!(prefix, error = %err, "registry info is not valid JSON");
                return None;
            }
        };

        let versions = value.get("versions")?.as_array()?;
        let mut latest: Option<VersionInfo> = None;
        for version in versions {
            let Some(file_url) = string_field(version, &["fileURL"]) else {
                continue;
            };
            let Some(raw_issued) = string_field(version, &["issued"]) else {
                continue;
            };
            let Some(issued_at) = parse_issued(&raw_issued) else {
                continue;
            };
            match &latest {
                Some(current) if current.issued_at >= issued_at => {}
                _ => {
                    latest = Some(VersionInfo {
                        file_url,
                        issued_at,
                    })
                }
            }
        }
        latest
    }
}

/// Returns the first non-empty string value among the candidate keys.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

/// Parses an ISO-8601 issuance timestamp. Accepts full RFC 3339
/// date-times and bare dates (taken as midnight UTC).
fn parse_issued(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_field_walks_the_fallback_chain() {
        let value = json!({"vocab": "ex", "nsp": "http://example.org/ex#"});
        assert_eq!(
            string_field(&value, &["prefix", "vocab"]).as_deref(),
            Some("ex")
        );
        assert_eq!(string_field(&value, &["uri"]), None);
        assert_eq!(
            string_field(&value, &["nsp", "namespace"]).as_deref(),
            Some("http://example.org/ex#")
        );
    }

    #[test]
    fn string_field_skips_empty_values() {
        let value = json!({"prefix": "  ", "vocab": "ex"});
        assert_eq!(
            string_field(&value, &["prefix", "vocab"]).as_deref(),
            Some("ex")
        );
    }

    #[test]
    fn issued_accepts_datetimes_and_bare_dates() {
        let datetime = parse_issued("2023-01-01T12:30:00Z").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2023-01-01T12:30:00+00:00");

        let date = parse_issued("2023-01-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2023-01-01T00:00:00+00:00");

        assert_eq!(parse_issued("January 2023"), None);
    }
}
