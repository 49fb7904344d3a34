//! biokg Pipeline - Knowledge graph build orchestrator
//!
//! Wires the full extraction-refinement-persistence flow:
//! text chunks → proposer → parser → validator → dedup → indexing →
//! adversarial refinement (optional) → typed idempotent upserts.
//!
//! The proposer and the graph sink are injected at construction so tests
//! and alternative deployments can substitute their own; nothing here
//! reaches for process-wide handles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use biokg_core::{Proposer, RefineConfig, Result, Triple};
use biokg_extractor::{
    extraction_prompt, parse_triples, relation_tag, EntityKind, NoopOntology, OntologyLookup,
    RelationTag, TripleValidator,
};
use biokg_graph::GraphSink;
use biokg_kge::{
    dedup_triples, refine, Adam, AdversarialTrainer, DistMult, GraphIndex, RefinementReport,
    TransE,
};

pub mod llm;

pub use llm::{create_proposer, OllamaProposer, OpenAiProposer};

/// Concurrent upserts against the sink; triples are independent and the
/// sink's merge contract makes ordering irrelevant
const SINK_CONCURRENCY: usize = 8;

// ============================================================================
// Build Summary
// ============================================================================

/// Summary of one knowledge graph build run
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Unique identifier for this run
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Text chunks processed
    pub chunk_count: usize,

    /// Deduplicated rule-validated candidates
    pub candidate_count: usize,

    /// Triples that survived refinement (equals `candidate_count` in
    /// passthrough mode)
    pub refined_count: usize,

    /// Triples actually persisted to the sink
    pub persisted_count: usize,

    /// Refinement metrics; `None` in passthrough mode
    pub refinement: Option<RefinementReport>,
}

// ============================================================================
// Knowledge Graph Builder
// ============================================================================

/// Pipeline orchestrator
pub struct KgBuilder {
    /// Triple proposer (LLM)
    proposer: Arc<dyn Proposer>,

    /// Graph persistence backend
    sink: Arc<dyn GraphSink>,

    /// Ontology existence hook (noop by default)
    ontology: Arc<dyn OntologyLookup>,

    /// Rule-based validator
    validator: TripleValidator,

    /// Refinement configuration
    config: RefineConfig,
}

impl KgBuilder {
    /// Create a builder with the default (noop) ontology hook
    pub fn new(proposer: Arc<dyn Proposer>, sink: Arc<dyn GraphSink>, config: RefineConfig) -> Self {
        Self {
            proposer,
            sink,
            ontology: Arc::new(NoopOntology),
            validator: TripleValidator::new(),
            config,
        }
    }

    /// Substitute an ontology lookup
    pub fn with_ontology(mut self, ontology: Arc<dyn OntologyLookup>) -> Self {
        self.ontology = ontology;
        self
    }

    /// Run the full pipeline over a collection of text chunks
    pub async fn build(&self, chunks: &[String]) -> Result<BuildSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, chunks = chunks.len(), proposer = self.proposer.name(), "knowledge graph build started");

        // 1. Extract rule-validated candidates from every chunk
        let mut candidates = Vec::new();
        for chunk in chunks {
            candidates.extend(self.extract_chunk(chunk).await?);
        }

        // 2. Set semantics over the candidate pool
        let candidates = dedup_triples(candidates);
        tracing::info!(candidates = candidates.len(), "candidate triples collected");

        // 3. Adversarial refinement, unless bypassed
        let (refined, refinement) = if self.config.train_gan {
            let (refined, report) = self.refine_candidates(&candidates)?;
            (refined, Some(report))
        } else {
            tracing::info!("skipping adversarial refinement; using rule-validated triples");
            (candidates.clone(), None)
        };

        // 4. Persist survivors with typed nodes
        let persisted_count = self.persist(&refined).await;
        tracing::info!(%run_id, persisted = persisted_count, "knowledge graph built with {} refined triples", refined.len());

        Ok(BuildSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            chunk_count: chunks.len(),
            candidate_count: candidates.len(),
            refined_count: refined.len(),
            persisted_count,
            refinement,
        })
    }

    /// Propose, parse, and validate triples for one chunk
    async fn extract_chunk(&self, text: &str) -> Result<Vec<Triple>> {
        let reply = self.proposer.propose(&extraction_prompt(text)).await?;

        let mut accepted = Vec::new();
        for raw in parse_triples(&reply) {
            if !self
                .validator
                .validate(&raw.subject, &raw.predicate, &raw.object)
            {
                continue;
            }

            let triple = raw.trimmed();
            if relation_tag(&triple.predicate) == RelationTag::Uncommon {
                tracing::warn!(
                    predicate = %triple.predicate,
                    "uncommon relation - consider human review or ontology enrichment"
                );
            }
            if !self.ontology.confirm(&triple.subject) || !self.ontology.confirm(&triple.object) {
                continue;
            }

            accepted.push(triple);
        }

        Ok(accepted)
    }

    /// Index the candidates, run pretraining and adversarial rounds, and
    /// keep the triples the discriminator accepts
    fn refine_candidates(&self, candidates: &[Triple]) -> Result<(Vec<Triple>, RefinementReport)> {
        let (index, indexed) = GraphIndex::build(candidates)?;

        let mut trainer = AdversarialTrainer::new(self.config.clone());
        let dim = self.config.embedding_dim;
        let mut generator =
            DistMult::new(index.num_entities(), index.num_relations(), dim, trainer.rng());
        let mut discriminator =
            TransE::new(index.num_entities(), index.num_relations(), dim, trainer.rng());
        let mut g_optimizer = Adam::new(&generator, self.config.learning_rate);
        let mut d_optimizer = Adam::new(&discriminator, self.config.learning_rate);

        trainer.pretrain(&mut generator, &mut g_optimizer, &indexed)?;
        trainer.pretrain(&mut discriminator, &mut d_optimizer, &indexed)?;
        trainer.train(
            &mut generator,
            &mut g_optimizer,
            &mut discriminator,
            &mut d_optimizer,
            &indexed,
        )?;

        let (kept, report) = refine(&discriminator, &index, &indexed)?;
        tracing::info!("{}", report.summary());

        Ok((kept, report))
    }

    /// Upsert each triple; failures are logged and skipped so a partial
    /// graph still lands
    async fn persist(&self, triples: &[Triple]) -> usize {
        stream::iter(triples)
            .map(|triple| async move {
                let subject_kind = EntityKind::classify(&triple.subject);
                let object_kind = EntityKind::classify(&triple.object);

                match self
                    .sink
                    .upsert(
                        subject_kind.as_str(),
                        &triple.subject,
                        &triple.predicate,
                        object_kind.as_str(),
                        &triple.object,
                    )
                    .await
                {
                    Ok(()) => 1usize,
                    Err(e) => {
                        tracing::warn!(triple = %triple, error = %e, "failed to persist triple; continuing");
                        0
                    }
                }
            })
            .buffer_unordered(SINK_CONCURRENCY)
            .fold(0usize, |acc, n| async move { acc + n })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use biokg_core::BiokgError;
    use std::sync::Mutex;

    /// Proposer that replies with the same canned string for every chunk
    struct FakeProposer {
        reply: String,
    }

    #[async_trait]
    impl Proposer for FakeProposer {
        async fn propose(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    /// Sink that records upserts in memory
    #[derive(Default)]
    struct FakeSink {
        upserts: Mutex<Vec<(String, String, String, String, String)>>,
    }

    #[async_trait]
    impl GraphSink for FakeSink {
        async fn upsert(
            &self,
            subject_kind: &str,
            subject: &str,
            predicate: &str,
            object_kind: &str,
            object: &str,
        ) -> Result<()> {
            self.upserts.lock().unwrap().push((
                subject_kind.to_string(),
                subject.to_string(),
                predicate.to_string(),
                object_kind.to_string(),
                object.to_string(),
            ));
            Ok(())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    /// Sink that rejects one specific subject
    struct FlakySink {
        poison: String,
        accepted: Mutex<usize>,
    }

    #[async_trait]
    impl GraphSink for FlakySink {
        async fn upsert(
            &self,
            _subject_kind: &str,
            subject: &str,
            _predicate: &str,
            _object_kind: &str,
            _object: &str,
        ) -> Result<()> {
            if subject == self.poison {
                return Err(BiokgError::Database("connection reset".to_string()));
            }
            *self.accepted.lock().unwrap() += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn passthrough_config() -> RefineConfig {
        RefineConfig {
            train_gan: false,
            ..Default::default()
        }
    }

    fn seven_triple_reply() -> String {
        "A, treats, B; C, treats, D; E, causes, F; G, is_a, H; \
         I, interacts_with, J; K, has_side_effect, L; M, treats, N;"
            .to_string()
    }

    #[tokio::test]
    async fn test_passthrough_preserves_candidate_set() {
        let proposer = Arc::new(FakeProposer {
            reply: seven_triple_reply(),
        });
        let sink = Arc::new(FakeSink::default());
        let builder = KgBuilder::new(proposer, sink.clone(), passthrough_config());

        let summary = builder.build(&["chunk".to_string()]).await.unwrap();

        assert_eq!(summary.candidate_count, 7);
        assert_eq!(summary.refined_count, 7);
        assert_eq!(summary.persisted_count, 7);
        assert!(summary.refinement.is_none());
        assert_eq!(sink.upserts.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_duplicate_candidates_collapse_across_chunks() {
        let proposer = Arc::new(FakeProposer {
            reply: "Aspirin, treats, headache;".to_string(),
        });
        let sink = Arc::new(FakeSink::default());
        let builder = KgBuilder::new(proposer, sink.clone(), passthrough_config());

        let chunks = vec!["first chunk".to_string(), "second chunk".to_string()];
        let summary = builder.build(&chunks).await.unwrap();

        assert_eq!(summary.chunk_count, 2);
        assert_eq!(summary.candidate_count, 1);
        assert_eq!(summary.persisted_count, 1);
    }

    #[tokio::test]
    async fn test_invalid_candidates_are_excluded() {
        // Missing subject, punctuation predicate, and a valid triple
        let proposer = Arc::new(FakeProposer {
            reply: ", treats, headache; Aspirin, tr3ats!!, headache; Aspirin, treats, headache;"
                .to_string(),
        });
        let sink = Arc::new(FakeSink::default());
        let builder = KgBuilder::new(proposer, sink.clone(), passthrough_config());

        let summary = builder.build(&["chunk".to_string()]).await.unwrap();

        assert_eq!(summary.candidate_count, 1);
        let upserts = sink.upserts.lock().unwrap();
        assert_eq!(upserts[0].1, "Aspirin");
    }

    #[tokio::test]
    async fn test_entity_kinds_label_nodes() {
        let proposer = Arc::new(FakeProposer {
            reply: "pain medication, treats, heart disease;".to_string(),
        });
        let sink = Arc::new(FakeSink::default());
        let builder = KgBuilder::new(proposer, sink.clone(), passthrough_config());

        builder.build(&["chunk".to_string()]).await.unwrap();

        let upserts = sink.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, "Drug");
        assert_eq!(upserts[0].3, "Disease");
    }

    #[tokio::test]
    async fn test_sink_failures_are_skipped_not_fatal() {
        let proposer = Arc::new(FakeProposer {
            reply: "A, treats, B; Bad, treats, C; D, treats, E;".to_string(),
        });
        let sink = Arc::new(FlakySink {
            poison: "Bad".to_string(),
            accepted: Mutex::new(0),
        });
        let builder = KgBuilder::new(proposer, sink.clone(), passthrough_config());

        let summary = builder.build(&["chunk".to_string()]).await.unwrap();

        assert_eq!(summary.refined_count, 3);
        assert_eq!(summary.persisted_count, 2);
        assert_eq!(*sink.accepted.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_refinement_mode_reports_metrics() {
        let proposer = Arc::new(FakeProposer {
            reply: seven_triple_reply(),
        });
        let sink = Arc::new(FakeSink::default());
        let config = RefineConfig {
            train_gan: true,
            embedding_dim: 4,
            epochs: 1,
            batch_size: 4,
            neg_sample_size: 3,
            pretrain_epochs: 1,
            ..Default::default()
        };
        let builder = KgBuilder::new(proposer, sink.clone(), config);

        let summary = builder.build(&["chunk".to_string()]).await.unwrap();

        let report = summary.refinement.expect("refinement report");
        assert_eq!(report.total, 7);
        assert_eq!(report.kept, summary.refined_count);
        assert_eq!(summary.persisted_count, summary.refined_count);
        assert!((report.assumed_gold - 6.3).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_empty_chunks_build_empty_graph() {
        let proposer = Arc::new(FakeProposer {
            reply: String::new(),
        });
        let sink = Arc::new(FakeSink::default());
        let builder = KgBuilder::new(proposer, sink.clone(), RefineConfig::default());

        let summary = builder.build(&[]).await.unwrap();

        assert_eq!(summary.candidate_count, 0);
        assert_eq!(summary.persisted_count, 0);
    }
}
