//! Serialization detection for fetched vocabulary payloads.
//!
//! Resolution order: declared media type first, then the source URL's
//! file extension, then a best-effort guess. RDF/XML and JSON-LD are
//! recognized but unsupported; they short-circuit to
//! [`Detection::Unsupported`] even when an extension hint would
//! otherwise match. Servers mislabel RDF content often enough that an
//! inconclusive detection falls back to Turtle rather than rejecting
//! the payload; the fallback is surfaced as [`Detection::Guessed`] so
//! downstream records can tell a guess from a confident match.

use url::Url;

/// The graph serializations the mirror can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfSerialization {
    Turtle,
    NTriples,
    NQuads,
    TriG,
}

impl RdfSerialization {
    /// Canonical media type for `Accept` headers and metadata records.
    pub fn media_type(&self) -> &'static str {
        match self {
            RdfSerialization::Turtle => "text/turtle",
            RdfSerialization::NTriples => "application/n-triples",
            RdfSerialization::NQuads => "application/n-quads",
            RdfSerialization::TriG => "application/trig",
        }
    }

    /// Short human-readable name used in notes and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            RdfSerialization::Turtle => "Turtle",
            RdfSerialization::NTriples => "N-Triples",
            RdfSerialization::NQuads => "N-Quads",
            RdfSerialization::TriG => "TriG",
        }
    }
}

impl std::fmt::Display for RdfSerialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of serialization detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The media type or extension named a supported serialization.
    Matched(RdfSerialization),
    /// Nothing matched; Turtle assumed as the most common serialization.
    Guessed(RdfSerialization),
    /// The payload is in a recognized but unsupported serialization.
    /// Terminal and non-retryable; not an error.
    Unsupported { reason: String },
}

fn media_type_lookup(media_type: &str) -> Option<RdfSerialization> {
    match media_type {
        "text/turtle" | "application/x-turtle" => Some(RdfSerialization::Turtle),
        "application/n-triples" | "text/plain" => Some(RdfSerialization::NTriples),
        "application/n-quads" | "text/x-nquads" => Some(RdfSerialization::NQuads),
        "application/trig" | "application/x-trig" => Some(RdfSerialization::TriG),
        _ => None,
    }
}

fn media_type_unsupported(media_type: &str) -> Option<&'static str> {
    match media_type {
        "application/rdf+xml" | "application/xml" | "text/xml" => Some("RDF/XML"),
        "application/ld+json" | "application/json" => Some("JSON-LD"),
        _ => None,
    }
}

fn extension_lookup(extension: &str) -> Option<RdfSerialization> {
    match extension {
        "ttl" => Some(RdfSerialization::Turtle),
        "nt" => Some(RdfSerialization::NTriples),
        "nq" => Some(RdfSerialization::NQuads),
        "trig" => Some(RdfSerialization::TriG),
        _ => None,
    }
}

fn extension_unsupported(extension: &str) -> Option<&'static str> {
    match extension {
        "rdf" | "owl" | "xml" => Some("RDF/XML"),
        "jsonld" | "json" => Some("JSON-LD"),
        _ => None,
    }
}

/// Strips parameters (`;charset=...`) and lowercases a declared
/// content type.
fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Extracts a lowercased file extension from the source URL's path,
/// ignoring query and fragment.
fn url_extension(source_url: &str) -> Option<String> {
    let path = match Url::parse(source_url) {
        Ok(url) => url.path().to_string(),
        // Not a parseable absolute URL; fall back to the raw string
        // with any query/fragment chopped off.
        Err(_) => source_url
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .to_string(),
    };
    let file = path.rsplit('/').next()?;
    let (_, extension) = file.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

/// Maps a declared content type and source URL to a serialization.
///
/// See the module docs for the resolution order.
pub fn detect(content_type: Option<&str>, source_url: &str) -> Detection {
    if let Some(raw) = content_type {
        let media_type = normalize_media_type(raw);
        if !media_type.is_empty() {
            if let Some(kind) = media_type_lookup(&media_type) {
                return Detection::Matched(kind);
            }
            if let Some(family) = media_type_unsupported(&media_type) {
                return Detection::Unsupported {
                    reason: format!("unsupported serialization {family} (media type {media_type})"),
                };
            }
        }
    }

    if let Some(extension) = url_extension(source_url) {
        if let Some(kind) = extension_lookup(&extension) {
            return Detection::Matched(kind);
        }
        if let Some(family) = extension_unsupported(&extension) {
            return Detection::Unsupported {
                reason: format!("unsupported serialization {family} (extension .{extension})"),
            };
        }
    }

    Detection::Guessed(RdfSerialization::Turtle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_types_map_to_supported_serializations() {
        let cases = [
            ("text/turtle", RdfSerialization::Turtle),
            ("application/x-turtle", RdfSerialization::Turtle),
            ("application/n-triples", RdfSerialization::NTriples),
            ("text/plain", RdfSerialization::NTriples),
            ("application/n-quads", RdfSerialization::NQuads),
            ("text/x-nquads", RdfSerialization::NQuads),
            ("application/trig", RdfSerialization::TriG),
            ("application/x-trig", RdfSerialization::TriG),
        ];
        for (media_type, expected) in cases {
            assert_eq!(
                detect(Some(media_type), "http://example.org/vocab"),
                Detection::Matched(expected),
                "media type {media_type}"
            );
        }
    }

    #[test]
    fn media_type_parameters_and_case_are_ignored() {
        assert_eq!(
            detect(Some("Text/Turtle; charset=UTF-8"), "http://example.org/v"),
            Detection::Matched(RdfSerialization::Turtle)
        );
    }

    #[test]
    fn extension_fallback_applies_without_media_type() {
        let cases = [
            ("http://example.org/v.ttl", RdfSerialization::Turtle),
            ("http://example.org/v.nt", RdfSerialization::NTriples),
            ("http://example.org/v.nq", RdfSerialization::NQuads),
            ("http://example.org/v.trig", RdfSerialization::TriG),
        ];
        for (url, expected) in cases {
            assert_eq!(detect(None, url), Detection::Matched(expected), "url {url}");
        }
    }

    #[test]
    fn extension_ignores_query_and_fragment() {
        assert_eq!(
            detect(None, "http://example.org/v.ttl?version=2#frag"),
            Detection::Matched(RdfSerialization::Turtle)
        );
    }

    #[test]
    fn unsupported_media_type_wins_over_matching_extension() {
        // The extension hints Turtle but the declared type is RDF/XML;
        // the unsupported family is terminal.
        let detection = detect(Some("application/rdf+xml"), "http://example.org/v.ttl");
        assert!(matches!(detection, Detection::Unsupported { .. }));
    }

    #[test]
    fn unsupported_extensions_are_terminal() {
        for url in [
            "http://example.org/v.rdf",
            "http://example.org/v.owl",
            "http://example.org/v.jsonld",
            "http://example.org/v.json",
        ] {
            assert!(
                matches!(detect(None, url), Detection::Unsupported { .. }),
                "url {url}"
            );
        }
    }

    #[test]
    fn inconclusive_detection_guesses_turtle() {
        assert_eq!(
            detect(Some("application/octet-stream"), "http://example.org/vocab"),
            Detection::Guessed(RdfSerialization::Turtle)
        );
        assert_eq!(
            detect(None, "http://example.org/vocab"),
            Detection::Guessed(RdfSerialization::Turtle)
        );
    }
}
