//! Aggregation of per-vocabulary outcomes into global and
//! per-namespace summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::MirrorError;
use crate::html;
use crate::pipeline::VocabularyResult;
use crate::store::MirrorStore;

/// The global run summary, also serialized to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorSummary {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// All results, sorted by prefix.
    pub vocabularies: Vec<VocabularyResult>,
}

/// One namespace group's summary.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceSummary {
    pub namespace: String,
    pub total: usize,
    pub succeeded: usize,
    pub vocabularies: Vec<VocabularyResult>,
}

/// Sorts results, computes counts, groups by declared namespace and
/// writes the summary files. Entries without a namespace stay out of
/// the groups but remain in the global list.
pub async fn aggregate(
    store: &MirrorStore,
    mut results: Vec<VocabularyResult>,
) -> Result<MirrorSummary, MirrorError> {
    results.sort_by(|a, b| a.prefix.cmp(&b.prefix));

    let total = results.len();
    let succeeded = results.iter().filter(|result| result.ok).count();
    let skipped = results.iter().filter(|result| result.skipped).count();
    let failed = total - succeeded - skipped;

    let mut groups: BTreeMap<String, Vec<VocabularyResult>> = BTreeMap::new();
    for result in &results {
        if let Some(namespace) = &result.namespace {
            groups
                .entry(namespace.clone())
                .or_default()
                .push(result.clone());
        }
    }
    for (namespace, vocabularies) in groups {
        let group = NamespaceSummary {
            namespace: namespace.clone(),
            total: vocabularies.len(),
            succeeded: vocabularies.iter().filter(|result| result.ok).count(),
            vocabularies,
        };
        let json = serde_json::to_string_pretty(&group)?;
        let page = html::namespace_page(&group);
        store
            .write_namespace_summary(&namespace, &json, &page)
            .await?;
    }

    let summary = MirrorSummary {
        generated_at: Utc::now(),
        total,
        succeeded,
        skipped,
        failed,
        vocabularies: results,
    };
    let json = serde_json::to_string_pretty(&summary)?;
    let page = html::global_page(&summary);
    store.write_global_summary(&json, &page).await?;
    Ok(summary)
}
