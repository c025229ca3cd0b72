//! Browsing pages for the mirror tree.
//!
//! Plain string assembly; the pages are deliberately minimal and carry
//! no styling beyond what keeps them readable. Everything interpolated
//! from vocabulary data is escaped.

use crate::index::{MirrorSummary, NamespaceSummary};
use crate::pipeline::VocabularyResult;
use crate::store::VocabularyMeta;
use crate::terms::TermSummary;

/// Escapes text for interpolation into HTML content and attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

fn term_list(heading: &str, terms: &[TermSummary]) -> String {
    if terms.is_empty() {
        return String::new();
    }
    let mut section = format!("<h2>{} ({})</h2>\n<ul>\n", escape(heading), terms.len());
    for term in terms {
        let label = term.label.as_deref().unwrap_or(&term.iri);
        section.push_str(&format!(
            "<li><code>{}</code>: {}",
            escape(&term.iri),
            escape(label)
        ));
        if let Some(description) = &term.description {
            section.push_str(&format!("<br><small>{}</small>", escape(description)));
        }
        section.push_str("</li>\n");
    }
    section.push_str("</ul>\n");
    section
}

/// Per-vocabulary browsing page listing its terms.
pub fn vocabulary_page(meta: &VocabularyMeta) -> String {
    let mut body = format!(
        "<h1>{}</h1>\n<p><a href=\"{}\">{}</a></p>\n",
        escape(&meta.prefix),
        escape(&meta.canonical_uri),
        escape(&meta.canonical_uri)
    );
    if let Some(namespace) = &meta.namespace {
        body.push_str(&format!("<p>Namespace: <code>{}</code></p>\n", escape(namespace)));
    }
    if let Some(version) = &meta.version {
        body.push_str(&format!(
            "<p>Version issued {} from <code>{}</code></p>\n",
            version.issued_at.to_rfc3339(),
            escape(&version.file_url)
        ));
    }
    body.push_str(&term_list("Classes", &meta.class_terms));
    body.push_str(&term_list("Properties", &meta.property_terms));
    page(&format!("Vocabulary: {}", meta.prefix), &body)
}

fn result_row(result: &VocabularyResult) -> String {
    let status = if result.ok {
        if result.cached { "cached" } else { "ok" }
    } else if result.skipped {
        "skipped"
    } else {
        "failed"
    };
    format!(
        "<tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape(&result.prefix),
        escape(&result.canonical_uri),
        status,
        result.status_code,
        escape(result.note.as_deref().unwrap_or("")),
    )
}

fn result_table(results: &[VocabularyResult]) -> String {
    let mut table = String::from(
        "<table>\n<tr><th>prefix</th><th>URI</th><th>status</th><th>code</th><th>note</th></tr>\n",
    );
    for result in results {
        table.push_str(&result_row(result));
    }
    table.push_str("</table>\n");
    table
}

/// The root browsing page over all vocabularies.
pub fn global_page(summary: &MirrorSummary) -> String {
    let mut body = format!(
        "<h1>Vocabulary mirror</h1>\n<p>{} vocabularies: {} mirrored, {} skipped, {} failed.</p>\n",
        summary.total, summary.succeeded, summary.skipped, summary.failed
    );
    body.push_str(&result_table(&summary.vocabularies));
    page("Vocabulary mirror", &body)
}

/// One namespace group's browsing page.
pub fn namespace_page(summary: &NamespaceSummary) -> String {
    let mut body = format!(
        "<h1>Namespace <code>{}</code></h1>\n<p>{} vocabularies, {} mirrored.</p>\n",
        escape(&summary.namespace),
        summary.total,
        summary.succeeded
    );
    body.push_str(&result_table(&summary.vocabularies));
    page(&format!("Namespace: {}", summary.namespace), &body)
}
