//! Parsing and canonical serialization of vocabulary graphs.
//!
//! Any supported serialization parses into an [`oxrdf::Dataset`];
//! serialization always emits N-Quads with lexicographically sorted
//! lines, so equal quad sets produce byte-identical artifacts across
//! runs regardless of input ordering.

use oxrdf::{Dataset, GraphName};
use oxttl::{NQuadsParser, NTriplesParser, TriGParser, TurtleParser};
use thiserror::Error;

use crate::format::RdfSerialization;

/// Structured parse/conversion failure.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The vocabulary's canonical URI is not a valid base IRI.
    #[error("invalid base IRI {base}: {message}")]
    InvalidBase { base: String, message: String },

    /// Malformed input in a nominally supported serialization.
    #[error("{kind} parse error: {message}")]
    Parse {
        kind: RdfSerialization,
        message: String,
    },
}

impl GraphError {
    fn parse(kind: RdfSerialization, err: impl std::fmt::Display) -> Self {
        GraphError::Parse {
            kind,
            message: err.to_string(),
        }
    }
}

/// Parses `text` as the given serialization into a quad collection.
///
/// Relative IRIs are resolved against `base_iri` (the vocabulary's
/// canonical URI). Only Turtle and TriG can carry relative IRIs; the
/// line-oriented serializations require absolute IRIs by definition,
/// so the base is unused there.
pub fn parse(
    text: &str,
    kind: RdfSerialization,
    base_iri: &str,
) -> Result<Dataset, GraphError> {
    let mut dataset = Dataset::new();
    let bytes = text.as_bytes();
    match kind {
        RdfSerialization::Turtle => {
            let parser = TurtleParser::new()
                .with_base_iri(base_iri)
                .map_err(|err| GraphError::InvalidBase {
                    base: base_iri.to_string(),
                    message: err.to_string(),
                })?;
            for triple in parser.for_slice(bytes) {
                let triple = triple.map_err(|err| GraphError::parse(kind, err))?;
                dataset.insert(&triple.in_graph(GraphName::DefaultGraph));
            }
        }
        RdfSerialization::NTriples => {
            for triple in NTriplesParser::new().for_slice(bytes) {
                let triple = triple.map_err(|err| GraphError::parse(kind, err))?;
                dataset.insert(&triple.in_graph(GraphName::DefaultGraph));
            }
        }
        RdfSerialization::NQuads => {
            for quad in NQuadsParser::new().for_slice(bytes) {
                let quad = quad.map_err(|err| GraphError::parse(kind, err))?;
                dataset.insert(&quad);
            }
        }
        RdfSerialization::TriG => {
            let parser = TriGParser::new()
                .with_base_iri(base_iri)
                .map_err(|err| GraphError::InvalidBase {
                    base: base_iri.to_string(),
                    message: err.to_string(),
                })?;
            for quad in parser.for_slice(bytes) {
                let quad = quad.map_err(|err| GraphError::parse(kind, err))?;
                dataset.insert(&quad);
            }
        }
    }
    Ok(dataset)
}

/// Serializes a quad collection as canonical N-Quads.
///
/// One quad per line, lines sorted; deterministic for equal quad sets.
pub fn serialize(dataset: &Dataset) -> String {
    let mut lines: Vec<String> = dataset.iter().map(|quad| format!("{quad} .\n")).collect();
    lines.sort_unstable();
    lines.concat()
}

/// Serializes an explicit quad list (e.g. a tiny term file) the same
/// way [`serialize`] renders a whole dataset.
pub fn serialize_quads(quads: &[oxrdf::Quad]) -> String {
    let mut lines: Vec<String> = quads.iter().map(|quad| format!("{quad} .\n")).collect();
    lines.sort_unstable();
    lines.concat()
}
