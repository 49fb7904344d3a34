//! Rule-based triple validation
//!
//! Acceptance is deliberately permissive: the rules reject only empty
//! fields and malformed predicates. The relation whitelist does not gate
//! acceptance; it only classifies predicates for quality signaling.

use regex::Regex;

/// Relations the pipeline considers well-established for this domain.
///
/// Predicates outside this list are still accepted; the pipeline flags
/// them for human review or ontology enrichment (e.g. UMLS).
pub const COMMON_RELATIONS: [&str; 5] =
    ["treats", "causes", "interacts_with", "is_a", "has_side_effect"];

/// Diagnostic classification of a predicate against [`COMMON_RELATIONS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationTag {
    /// Member of the whitelist (case-insensitive)
    Common,
    /// Outside the whitelist; recommend human review
    Uncommon,
}

/// Classify a predicate against the relation whitelist.
///
/// Pure classification: the result feeds a log message, never a filter.
pub fn relation_tag(predicate: &str) -> RelationTag {
    let lowered = predicate.trim().to_lowercase();
    if COMMON_RELATIONS.contains(&lowered.as_str()) {
        RelationTag::Common
    } else {
        RelationTag::Uncommon
    }
}

/// Rule-based validator for candidate triples
pub struct TripleValidator {
    predicate_shape: Regex,
}

impl TripleValidator {
    /// Create a validator with the standard predicate shape rules
    pub fn new() -> Self {
        Self {
            predicate_shape: Regex::new(r"^[a-zA-Z0-9_ -]+$").expect("static pattern"),
        }
    }

    /// Check whether a candidate triple is acceptable.
    ///
    /// Rejects triples with any empty field (after trimming) and
    /// predicates that have no whitespace tokens or contain characters
    /// outside letters, digits, underscore, space, and hyphen.
    pub fn validate(&self, subject: &str, predicate: &str, object: &str) -> bool {
        let subject = subject.trim();
        let predicate = predicate.trim();
        let object = object.trim();

        if subject.is_empty() || predicate.is_empty() || object.is_empty() {
            return false;
        }

        if predicate.split_whitespace().count() < 1 || !self.predicate_shape.is_match(predicate) {
            return false;
        }

        true
    }
}

impl Default for TripleValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Ontology lookup hook
// ============================================================================

/// Hook for confirming entity existence against an external ontology
/// (e.g. UMLS).
///
/// The pipeline ships with [`NoopOntology`], which confirms everything;
/// a placeholder kept visible on purpose: a production deployment should
/// substitute a real lookup here, but none is wired in yet.
pub trait OntologyLookup: Send + Sync {
    /// Confirm that an entity name exists in the ontology
    fn confirm(&self, entity: &str) -> bool;

    /// Get lookup name for logging
    fn name(&self) -> &str;
}

/// Always-confirming placeholder ontology lookup
pub struct NoopOntology;

impl OntologyLookup for NoopOntology {
    fn confirm(&self, _entity: &str) -> bool {
        true
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// ============================================================================
// Tests
// ============================================================================
