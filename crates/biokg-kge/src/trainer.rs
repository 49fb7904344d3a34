//! Adversarial trainer for the generator/discriminator pair
//!
//! Training proceeds in two phases over the indexed triple set:
//!
//! 1. **Pretraining**: each model independently, for a fixed number of
//!    passes: margin hinge loss against one uniformly-sampled negative
//!    tail per positive, one Adam step per batch.
//! 2. **Adversarial rounds**: per batch: sample a uniform candidate
//!    pool of negative tails, let the generator pick one hard negative
//!    per positive via softmax sampling, step the discriminator on the
//!    hinge loss against those negatives, then step the generator by
//!    REINFORCE with a per-example mean baseline (reward = negative
//!    discriminator score over the full pool).
//!
//! The loop runs the configured epoch count unconditionally, with no early
//! stopping. A non-finite batch loss aborts the run; a batch job has no
//! useful partial state mid-epoch.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use biokg_core::{BiokgError, RefineConfig, Result};

use crate::index::IndexedTriple;
use crate::models::{EmbeddingModel, Gradients};
use crate::optim::Adam;

/// Margin hinge loss: max(0, margin − pos + neg)
pub fn hinge(margin: f32, pos_score: f32, neg_score: f32) -> f32 {
    (margin - pos_score + neg_score).max(0.0)
}

/// Orchestrates pretraining and adversarial co-training.
///
/// All randomness flows through one seeded generator so runs are
/// reproducible under a fixed seed and candidate set.
pub struct AdversarialTrainer {
    config: RefineConfig,
    rng: StdRng,
}

impl AdversarialTrainer {
    /// Create a trainer seeded from the config
    pub fn new(config: RefineConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Source of randomness for model initialization, so that embedding
    /// tables draw from the same seeded stream as the sampling steps
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Margin-based pretraining of one model with uniform negative tails
    pub fn pretrain(
        &mut self,
        model: &mut dyn EmbeddingModel,
        optimizer: &mut Adam,
        triples: &[IndexedTriple],
    ) -> Result<()> {
        let num_entities = model.num_entities();
        if triples.is_empty() || num_entities == 0 {
            return Ok(());
        }

        let margin = self.config.margin;
        let mut grads = Gradients::for_model(model);

        for _ in 0..self.config.pretrain_epochs {
            for batch in triples.chunks(self.config.batch_size) {
                grads.reset();
                let inv = 1.0 / batch.len() as f32;
                let mut loss = 0.0;

                for triple in batch {
                    let neg_tail = self.rng.gen_range(0..num_entities);
                    let pos = model.score(triple.head, triple.relation, triple.tail);
                    let neg = model.score(triple.head, triple.relation, neg_tail);

                    let l = hinge(margin, pos, neg);
                    loss += l * inv;
                    if l > 0.0 {
                        model.backward(triple.head, triple.relation, triple.tail, -inv, &mut grads);
                        model.backward(triple.head, triple.relation, neg_tail, inv, &mut grads);
                    }
                }

                ensure_finite(loss, model.name())?;
                optimizer.step(model, &grads);
            }
        }

        tracing::debug!(model = model.name(), "pretraining completed");
        Ok(())
    }

    /// Adversarial co-training of the generator/discriminator pair.
    ///
    /// Updates within a batch are strictly ordered: the generator samples
    /// against the discriminator state from the previous batch, and the
    /// generator's rewards come from the just-updated discriminator.
    pub fn train(
        &mut self,
        generator: &mut dyn EmbeddingModel,
        g_optimizer: &mut Adam,
        discriminator: &mut dyn EmbeddingModel,
        d_optimizer: &mut Adam,
        triples: &[IndexedTriple],
    ) -> Result<()> {
        let num_entities = discriminator.num_entities();
        if triples.is_empty() || num_entities == 0 {
            tracing::warn!("no indexed triples to train on; skipping adversarial rounds");
            return Ok(());
        }

        let margin = self.config.margin;
        let pool_size = self.config.neg_sample_size;
        let epochs = self.config.epochs;

        let mut g_grads = Gradients::for_model(generator);
        let mut d_grads = Gradients::for_model(discriminator);

        for epoch in 0..epochs {
            for batch in triples.chunks(self.config.batch_size) {
                let batch_len = batch.len();

                // Candidate pool: uniform tails, independent of model state
                let mut pool = vec![vec![0usize; pool_size]; batch_len];
                for row in pool.iter_mut() {
                    for slot in row.iter_mut() {
                        *slot = self.rng.gen_range(0..num_entities);
                    }
                }

                // Generator proposes one hard negative per positive by
                // sampling its softmax over the pool (no gradient here)
                let gen_scores: Vec<Vec<f32>> = batch
                    .iter()
                    .zip(&pool)
                    .map(|(triple, candidates)| {
                        candidates
                            .iter()
                            .map(|&c| generator.score(triple.head, triple.relation, c))
                            .collect()
                    })
                    .collect();
                let probs: Vec<Vec<f32>> = gen_scores.iter().map(|row| softmax(row)).collect();

                let mut hard_negatives = Vec::with_capacity(batch_len);
                for (row, candidates) in probs.iter().zip(&pool) {
                    let drawn = sample_categorical(row, &mut self.rng);
                    hard_negatives.push(candidates[drawn]);
                }

                // Discriminator: separate true triples from the proposals
                d_grads.reset();
                let inv = 1.0 / batch_len as f32;
                let mut d_loss = 0.0;
                for (triple, &neg_tail) in batch.iter().zip(&hard_negatives) {
                    let pos = discriminator.score(triple.head, triple.relation, triple.tail);
                    let neg = discriminator.score(triple.head, triple.relation, neg_tail);

                    let l = hinge(margin, pos, neg);
                    d_loss += l * inv;
                    if l > 0.0 {
                        discriminator.backward(
                            triple.head,
                            triple.relation,
                            triple.tail,
                            -inv,
                            &mut d_grads,
                        );
                        discriminator.backward(
                            triple.head,
                            triple.relation,
                            neg_tail,
                            inv,
                            &mut d_grads,
                        );
                    }
                }
                ensure_finite(d_loss, discriminator.name())?;
                d_optimizer.step(discriminator, &d_grads);

                // Generator: REINFORCE with a per-example mean baseline.
                // Reward favors candidates the updated discriminator still
                // finds plausible; the baseline keeps the estimate low-variance.
                g_grads.reset();
                let pool_inv = 1.0 / (batch_len * pool_size) as f32;
                let mut g_loss = 0.0;
                for (i, triple) in batch.iter().enumerate() {
                    let rewards: Vec<f32> = pool[i]
                        .iter()
                        .map(|&c| -discriminator.score(triple.head, triple.relation, c))
                        .collect();
                    let baseline = rewards.iter().sum::<f32>() / pool_size as f32;
                    let advantages: Vec<f32> = rewards.iter().map(|r| r - baseline).collect();
                    let advantage_sum: f32 = advantages.iter().sum();
                    let log_probs = log_softmax(&gen_scores[i]);

                    for (j, &candidate) in pool[i].iter().enumerate() {
                        g_loss -= advantages[j] * log_probs[j] * pool_inv;
                        // d loss / d score through the log-softmax
                        let upstream = -pool_inv * (advantages[j] - probs[i][j] * advantage_sum);
                        generator.backward(
                            triple.head,
                            triple.relation,
                            candidate,
                            upstream,
                            &mut g_grads,
                        );
                    }
                }
                ensure_finite(g_loss, generator.name())?;
                g_optimizer.step(generator, &g_grads);
            }

            tracing::info!("epoch {}/{} completed", epoch + 1, epochs);
        }

        Ok(())
    }
}

fn ensure_finite(loss: f32, model: &str) -> Result<()> {
    if loss.is_finite() {
        Ok(())
    } else {
        Err(BiokgError::Training(format!(
            "non-finite loss while training {model}"
        )))
    }
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn log_softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let log_sum = scores
        .iter()
        .map(|s| (s - max).exp())
        .sum::<f32>()
        .ln()
        + max;
    scores.iter().map(|s| s - log_sum).collect()
}

fn sample_categorical(probs: &[f32], rng: &mut StdRng) -> usize {
    let draw: f32 = rng.gen();
    let mut cumulative = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return i;
        }
    }
    probs.len() - 1
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistMult, TransE};
    use proptest::prelude::*;

    fn sample_triples() -> Vec<IndexedTriple> {
        vec![
            IndexedTriple { head: 0, relation: 0, tail: 1 },
            IndexedTriple { head: 1, relation: 0, tail: 2 },
            IndexedTriple { head: 2, relation: 1, tail: 3 },
            IndexedTriple { head: 3, relation: 1, tail: 4 },
            IndexedTriple { head: 4, relation: 0, tail: 0 },
            IndexedTriple { head: 0, relation: 1, tail: 2 },
        ]
    }

    fn small_config() -> RefineConfig {
        RefineConfig {
            embedding_dim: 8,
            epochs: 2,
            batch_size: 4,
            neg_sample_size: 5,
            pretrain_epochs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_hinge_loss_values() {
        assert_eq!(hinge(1.0, 2.0, 0.0), 0.0);
        assert_eq!(hinge(1.0, 0.5, 0.0), 0.5);
        assert_eq!(hinge(1.0, 0.0, 1.0), 2.0);
    }

    #[test]
    fn test_softmax_normalizes() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_log_softmax_matches_softmax() {
        let scores = [0.3, -1.2, 2.5, 0.0];
        let probs = softmax(&scores);
        let log_probs = log_softmax(&scores);

        for (p, lp) in probs.iter().zip(&log_probs) {
            assert!((p.ln() - lp).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sample_categorical_degenerate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_categorical(&[1.0, 0.0, 0.0], &mut rng), 0);
        assert_eq!(sample_categorical(&[0.0, 0.0, 1.0], &mut rng), 2);
    }

    #[test]
    fn test_sample_categorical_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let probs = softmax(&[0.1, 0.4, 0.2, 0.3]);
        for _ in 0..100 {
            assert!(sample_categorical(&probs, &mut rng) < 4);
        }
    }

    #[test]
    fn test_pretrain_and_adversarial_rounds_run() {
        let triples = sample_triples();
        let config = small_config();
        let mut trainer = AdversarialTrainer::new(config.clone());

        let mut generator = DistMult::new(5, 2, config.embedding_dim, trainer.rng());
        let mut discriminator = TransE::new(5, 2, config.embedding_dim, trainer.rng());
        let mut g_opt = Adam::new(&generator, config.learning_rate);
        let mut d_opt = Adam::new(&discriminator, config.learning_rate);

        trainer
            .pretrain(&mut generator, &mut g_opt, &triples)
            .unwrap();
        trainer
            .pretrain(&mut discriminator, &mut d_opt, &triples)
            .unwrap();
        trainer
            .train(
                &mut generator,
                &mut g_opt,
                &mut discriminator,
                &mut d_opt,
                &triples,
            )
            .unwrap();

        for triple in &triples {
            assert!(generator
                .score(triple.head, triple.relation, triple.tail)
                .is_finite());
            assert!(discriminator
                .score(triple.head, triple.relation, triple.tail)
                .is_finite());
        }
    }

    #[test]
    fn test_training_is_reproducible_under_seed() {
        let triples = sample_triples();
        let config = small_config();

        let run = |config: RefineConfig| {
            let mut trainer = AdversarialTrainer::new(config.clone());
            let mut generator = DistMult::new(5, 2, config.embedding_dim, trainer.rng());
            let mut discriminator = TransE::new(5, 2, config.embedding_dim, trainer.rng());
            let mut g_opt = Adam::new(&generator, config.learning_rate);
            let mut d_opt = Adam::new(&discriminator, config.learning_rate);
            trainer
                .pretrain(&mut generator, &mut g_opt, &triples)
                .unwrap();
            trainer
                .pretrain(&mut discriminator, &mut d_opt, &triples)
                .unwrap();
            trainer
                .train(
                    &mut generator,
                    &mut g_opt,
                    &mut discriminator,
                    &mut d_opt,
                    &triples,
                )
                .unwrap();
            discriminator.score(0, 0, 1)
        };

        assert_eq!(run(config.clone()), run(config));
    }

    #[test]
    fn test_empty_triple_set_is_a_noop() {
        let config = small_config();
        let mut trainer = AdversarialTrainer::new(config.clone());

        let mut generator = DistMult::new(0, 0, config.embedding_dim, trainer.rng());
        let mut discriminator = TransE::new(0, 0, config.embedding_dim, trainer.rng());
        let mut g_opt = Adam::new(&generator, config.learning_rate);
        let mut d_opt = Adam::new(&discriminator, config.learning_rate);

        trainer.pretrain(&mut generator, &mut g_opt, &[]).unwrap();
        trainer
            .train(
                &mut generator,
                &mut g_opt,
                &mut discriminator,
                &mut d_opt,
                &[],
            )
            .unwrap();
    }

    proptest! {
        #[test]
        fn prop_hinge_monotone_in_negative_score(
            margin in 0.0f32..5.0,
            pos in -10.0f32..10.0,
            neg in -10.0f32..10.0,
            bump in 0.0f32..10.0,
        ) {
            // Raising the negative score never lowers the loss
            prop_assert!(hinge(margin, pos, neg + bump) >= hinge(margin, pos, neg));
        }

        #[test]
        fn prop_hinge_never_negative(
            margin in 0.0f32..5.0,
            pos in -10.0f32..10.0,
            neg in -10.0f32..10.0,
        ) {
            prop_assert!(hinge(margin, pos, neg) >= 0.0);
        }
    }
}
