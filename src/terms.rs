//! Term classification, summaries and tiny-file extraction.
//!
//! A subject becomes a class or property term solely through its
//! `rdf:type` assertions against the fixed recognized sets below.
//! Nothing prevents one subject from being both; untyped subjects are
//! neither.

use std::collections::BTreeSet;

use oxrdf::{Dataset, NamedNode, NamedNodeRef, Quad, SubjectRef, TermRef};
use serde::{Deserialize, Serialize};

use crate::vocab::{dcterms, owl, rdf, rdfs, skos};

/// Recognized class types.
const CLASS_TYPES: [NamedNodeRef<'static>; 2] = [rdfs::CLASS, owl::CLASS];

/// Recognized property types, generic and OWL subtypes.
const PROPERTY_TYPES: [NamedNodeRef<'static>; 10] = [
    rdf::PROPERTY,
    owl::OBJECT_PROPERTY,
    owl::DATATYPE_PROPERTY,
    owl::ANNOTATION_PROPERTY,
    owl::FUNCTIONAL_PROPERTY,
    owl::INVERSE_FUNCTIONAL_PROPERTY,
    owl::TRANSITIVE_PROPERTY,
    owl::SYMMETRIC_PROPERTY,
    owl::ASYMMETRIC_PROPERTY,
    owl::REFLEXIVE_PROPERTY,
];

/// Label candidates in priority order; the first predicate with at
/// least one literal value wins.
const LABEL_CANDIDATES: [NamedNodeRef<'static>; 3] =
    [skos::PREF_LABEL, rdfs::LABEL, dcterms::TITLE];

/// Description candidates in priority order.
const DESCRIPTION_CANDIDATES: [NamedNodeRef<'static>; 4] = [
    skos::DEFINITION,
    rdfs::COMMENT,
    dcterms::DESCRIPTION,
    skos::SCOPE_NOTE,
];

/// Definitional predicates a tiny term file may carry. Quads whose
/// predicate is not listed here are never written to a term file.
const TERM_PREDICATES: [NamedNodeRef<'static>; 19] = [
    rdf::TYPE,
    rdfs::LABEL,
    rdfs::COMMENT,
    rdfs::SEE_ALSO,
    rdfs::IS_DEFINED_BY,
    rdfs::SUB_CLASS_OF,
    rdfs::SUB_PROPERTY_OF,
    rdfs::DOMAIN,
    rdfs::RANGE,
    owl::EQUIVALENT_CLASS,
    owl::EQUIVALENT_PROPERTY,
    owl::INVERSE_OF,
    owl::DEPRECATED,
    skos::PREF_LABEL,
    skos::ALT_LABEL,
    skos::DEFINITION,
    skos::SCOPE_NOTE,
    dcterms::TITLE,
    dcterms::DESCRIPTION,
];

/// Class and property term IRIs found in one graph, deduplicated and
/// lexicographically sorted for deterministic downstream file naming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub classes: Vec<String>,
    pub properties: Vec<String>,
}

/// Short label/description summary for one term. Derived, never
/// stored independently; recomputed per extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSummary {
    pub iri: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

/// Scans all `rdf:type` quads and buckets IRI subjects into class and
/// property terms.
pub fn classify(dataset: &Dataset) -> Classified {
    let mut classes = BTreeSet::new();
    let mut properties = BTreeSet::new();
    for quad in dataset.iter() {
        if quad.predicate != rdf::TYPE {
            continue;
        }
        let SubjectRef::NamedNode(subject) = quad.subject else {
            continue;
        };
        let TermRef::NamedNode(object) = quad.object else {
            continue;
        };
        if CLASS_TYPES.iter().any(|class_type| *class_type == object) {
            classes.insert(subject.as_str().to_string());
        }
        if PROPERTY_TYPES
            .iter()
            .any(|property_type| *property_type == object)
        {
            properties.insert(subject.as_str().to_string());
        }
    }
    Classified {
        classes: classes.into_iter().collect(),
        properties: properties.into_iter().collect(),
    }
}

/// Extracts a label/description summary for `term_iri`.
///
/// Candidate predicates are tried in fixed priority order; absence of
/// any candidate yields `None`, not an error.
pub fn summarize(dataset: &Dataset, term_iri: &str) -> TermSummary {
    let Ok(subject) = NamedNode::new(term_iri) else {
        return TermSummary {
            iri: term_iri.to_string(),
            label: None,
            description: None,
        };
    };
    TermSummary {
        iri: term_iri.to_string(),
        label: first_literal(dataset, subject.as_ref(), &LABEL_CANDIDATES),
        description: first_literal(dataset, subject.as_ref(), &DESCRIPTION_CANDIDATES),
    }
}

fn first_literal(
    dataset: &Dataset,
    subject: NamedNodeRef<'_>,
    candidates: &[NamedNodeRef<'static>],
) -> Option<String> {
    for candidate in candidates {
        let found = dataset.iter().find_map(|quad| {
            if quad.subject != SubjectRef::NamedNode(subject) || quad.predicate != *candidate {
                return None;
            }
            match quad.object {
                TermRef::Literal(literal) => Some(literal.value().to_string()),
                _ => None,
            }
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Filters the graph to the quads a tiny term file may contain:
/// subject equals `term_iri` and predicate is on the definitional
/// allow-list. An empty result means "no file to write".
pub fn extract_term_quads(dataset: &Dataset, term_iri: &str) -> Vec<Quad> {
    let Ok(subject) = NamedNode::new(term_iri) else {
        return Vec::new();
    };
    dataset
        .iter()
        .filter(|quad| {
            quad.subject == SubjectRef::NamedNode(subject.as_ref())
                && TERM_PREDICATES
                    .iter()
                    .any(|predicate| *predicate == quad.predicate)
        })
        .map(|quad| quad.into_owned())
        .collect()
}
