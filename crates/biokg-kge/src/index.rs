//! Entity and relation indexing
//!
//! Assigns dense integer ids to the distinct entities and relations of a
//! candidate triple set and projects triples into index space for
//! training. Ids are assigned in encounter order: stable within one build
//! run, not promised across runs.

use std::collections::{HashMap, HashSet};

use biokg_core::{BiokgError, Result, Triple};

/// A triple projected into index space. Used only for training; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexedTriple {
    pub head: usize,
    pub relation: usize,
    pub tail: usize,
}

/// Deduplicate candidate triples, keeping first-seen order
pub fn dedup_triples(triples: Vec<Triple>) -> Vec<Triple> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for triple in triples {
        if seen.insert(triple.clone()) {
            unique.push(triple);
        }
    }

    unique
}

/// Bijective mapping between entity/relation names and dense ids.
///
/// Built once per pipeline run and immutable afterward. Predicates that
/// differ in case or whitespace stay distinct here; only the relation
/// whitelist check lower-cases.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    entities: Vec<String>,
    relations: Vec<String>,
    entity_ids: HashMap<String, usize>,
    relation_ids: HashMap<String, usize>,
}

impl GraphIndex {
    /// Build the index over a deduplicated triple set and project each
    /// triple into index space.
    ///
    /// Entities are the union of subjects and objects in encounter order.
    /// Fails only on internal inconsistency (a name missing from its own
    /// index), which construction order rules out.
    pub fn build(triples: &[Triple]) -> Result<(Self, Vec<IndexedTriple>)> {
        let mut index = Self::default();

        for triple in triples {
            index.intern_entity(&triple.subject);
            index.intern_entity(&triple.object);
            index.intern_relation(&triple.predicate);
        }

        let mut indexed = Vec::with_capacity(triples.len());
        for triple in triples {
            indexed.push(IndexedTriple {
                head: index.require_entity(&triple.subject)?,
                relation: index.require_relation(&triple.predicate)?,
                tail: index.require_entity(&triple.object)?,
            });
        }

        Ok((index, indexed))
    }

    fn intern_entity(&mut self, name: &str) {
        if !self.entity_ids.contains_key(name) {
            self.entity_ids.insert(name.to_string(), self.entities.len());
            self.entities.push(name.to_string());
        }
    }

    fn intern_relation(&mut self, name: &str) {
        if !self.relation_ids.contains_key(name) {
            self.relation_ids
                .insert(name.to_string(), self.relations.len());
            self.relations.push(name.to_string());
        }
    }

    fn require_entity(&self, name: &str) -> Result<usize> {
        self.entity_ids
            .get(name)
            .copied()
            .ok_or_else(|| BiokgError::Index(format!("entity missing from index: {name}")))
    }

    fn require_relation(&self, name: &str) -> Result<usize> {
        self.relation_ids
            .get(name)
            .copied()
            .ok_or_else(|| BiokgError::Index(format!("relation missing from index: {name}")))
    }

    /// Number of distinct entities
    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of distinct relations
    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }

    /// Entity name for an id
    pub fn entity(&self, id: usize) -> Option<&str> {
        self.entities.get(id).map(String::as_str)
    }

    /// Relation name for an id
    pub fn relation(&self, id: usize) -> Option<&str> {
        self.relations.get(id).map(String::as_str)
    }

    /// Id for an entity name
    pub fn entity_id(&self, name: &str) -> Option<usize> {
        self.entity_ids.get(name).copied()
    }

    /// Id for a relation name
    pub fn relation_id(&self, name: &str) -> Option<usize> {
        self.relation_ids.get(name).copied()
    }

    /// Reconstruct the source triple for an indexed triple
    pub fn triple_for(&self, indexed: &IndexedTriple) -> Result<Triple> {
        let subject = self
            .entity(indexed.head)
            .ok_or_else(|| BiokgError::Index(format!("entity id out of range: {}", indexed.head)))?;
        let predicate = self.relation(indexed.relation).ok_or_else(|| {
            BiokgError::Index(format!("relation id out of range: {}", indexed.relation))
        })?;
        let object = self
            .entity(indexed.tail)
            .ok_or_else(|| BiokgError::Index(format!("entity id out of range: {}", indexed.tail)))?;

        Ok(Triple::new(subject, predicate, object))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_build_two_entity_cycle() {
        let triples = vec![Triple::new("A", "r", "B"), Triple::new("B", "r", "A")];

        let (index, indexed) = GraphIndex::build(&triples).unwrap();

        assert_eq!(index.num_entities(), 2);
        assert_eq!(index.num_relations(), 1);
        assert_eq!(indexed.len(), 2);
        assert_ne!(indexed[0], indexed[1]);
    }

    #[test]
    fn test_ids_within_bounds() {
        let triples = vec![
            Triple::new("Aspirin", "treats", "headache"),
            Triple::new("Aspirin", "interacts_with", "Warfarin"),
            Triple::new("Warfarin", "treats", "thrombosis"),
        ];

        let (index, indexed) = GraphIndex::build(&triples).unwrap();

        for t in &indexed {
            assert!(t.head < index.num_entities());
            assert!(t.tail < index.num_entities());
            assert!(t.relation < index.num_relations());
        }
    }

    #[test]
    fn test_roundtrip_reconstruction() {
        let triples = vec![
            Triple::new("Aspirin", "treats", "headache"),
            Triple::new("Metformin", "treats", "diabetes condition"),
        ];

        let (index, indexed) = GraphIndex::build(&triples).unwrap();

        for (original, projected) in triples.iter().zip(&indexed) {
            assert_eq!(&index.triple_for(projected).unwrap(), original);
        }
    }

    #[test]
    fn test_dedup_keeps_one_copy_in_order() {
        let triples = vec![
            Triple::new("A", "r", "B"),
            Triple::new("C", "r", "D"),
            Triple::new("A", "r", "B"),
        ];

        let unique = dedup_triples(triples);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0], Triple::new("A", "r", "B"));
        assert_eq!(unique[1], Triple::new("C", "r", "D"));
    }

    #[test]
    fn test_predicate_case_variants_stay_distinct() {
        let triples = vec![Triple::new("A", "treats", "B"), Triple::new("A", "Treats", "B")];

        let (index, indexed) = GraphIndex::build(&triples).unwrap();

        assert_eq!(index.num_relations(), 2);
        assert_ne!(indexed[0].relation, indexed[1].relation);
    }

    #[test]
    fn test_empty_input() {
        let (index, indexed) = GraphIndex::build(&[]).unwrap();
        assert_eq!(index.num_entities(), 0);
        assert_eq!(index.num_relations(), 0);
        assert!(indexed.is_empty());
    }

    proptest! {
        #[test]
        fn prop_bounds_and_roundtrip(
            raw in proptest::collection::vec(("[a-c]{1,2}", "[r-t]{1}", "[a-c]{1,2}"), 0..20)
        ) {
            let triples = dedup_triples(
                raw.into_iter().map(|(s, p, o)| Triple::new(s, p, o)).collect(),
            );

            let (index, indexed) = GraphIndex::build(&triples).unwrap();

            prop_assert_eq!(triples.len(), indexed.len());
            for (original, projected) in triples.iter().zip(&indexed) {
                prop_assert!(projected.head < index.num_entities());
                prop_assert!(projected.tail < index.num_entities());
                prop_assert!(projected.relation < index.num_relations());
                prop_assert_eq!(&index.triple_for(projected).unwrap(), original);
            }
        }
    }
}
