//! Triple parser
//!
//! Splits one proposer reply into candidate triples. The proposer is asked
//! for `entity1, relation, entity2;` segments; anything that does not fit
//! that shape is dropped without error.

use crate::RawTriple;

/// Build the extraction prompt for one text span
pub fn extraction_prompt(text: &str) -> String {
    format!(
        "Extract knowledge graph triples as 'entity1, relation, entity2;' from biomedical text: {text}. \
         Focus on accurate drug/disease/compound relations."
    )
}

/// Parse a proposer reply into candidate triples.
///
/// Candidates are `;`-separated; each candidate is `,`-separated. A
/// candidate needs at least three comma parts: the last part is the
/// object, the second-to-last the predicate, and everything before is
/// re-joined with `,` as the subject, so subjects containing commas
/// survive. Shorter candidates are silently dropped. Order is preserved
/// and nothing is deduplicated or trimmed here.
pub fn parse_triples(raw: &str) -> Vec<RawTriple> {
    let mut triples = Vec::new();

    for candidate in raw.split(';') {
        let parts: Vec<&str> = candidate.split(',').collect();
        if parts.len() < 3 {
            continue;
        }

        triples.push(RawTriple {
            subject: parts[..parts.len() - 2].join(","),
            predicate: parts[parts.len() - 2].to_string(),
            object: parts[parts.len() - 1].to_string(),
        });
    }

    triples
}

// ============================================================================
// Tests
// ============================================================================
