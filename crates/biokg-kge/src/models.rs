//! Embedding scorers for triple plausibility
//!
//! Two models over the same capability interface:
//! - `DistMult`: score = Σ_d h·r·t (bilinear diagonal)
//! - `TransE`: score = −‖h + r − t‖₁ (translational)
//!
//! Higher scores mean more plausible triples in both cases. Each model
//! owns its own entity/relation tables; the generator and discriminator
//! never share parameters. Gradients are closed-form: the models are a
//! single embedding lookup deep, so no autograd is needed.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;

/// Dense gradient buffers matching a model's parameter tables
#[derive(Debug, Clone)]
pub struct Gradients {
    pub entities: Array2<f32>,
    pub relations: Array2<f32>,
}

impl Gradients {
    /// Zeroed buffers shaped like the given model's tables
    pub fn for_model(model: &dyn EmbeddingModel) -> Self {
        Self {
            entities: Array2::zeros((model.num_entities(), model.dim())),
            relations: Array2::zeros((model.num_relations(), model.dim())),
        }
    }

    /// Reset all accumulated gradients to zero
    pub fn reset(&mut self) {
        self.entities.fill(0.0);
        self.relations.fill(0.0);
    }
}

/// Mutable views over a model's parameter tables, for the optimizer
pub struct ParamsMut<'a> {
    pub entities: &'a mut Array2<f32>,
    pub relations: &'a mut Array2<f32>,
}

/// Capability interface shared by the generator and discriminator.
///
/// `backward` accumulates d(upstream · score)/d(params) into `grads`,
/// so a training step is: score forward, decide the upstream coefficient
/// from the loss, accumulate, then hand the buffers to the optimizer.
pub trait EmbeddingModel: Send {
    fn name(&self) -> &'static str;

    fn num_entities(&self) -> usize;

    fn num_relations(&self) -> usize;

    fn dim(&self) -> usize;

    /// Plausibility score for one (head, relation, tail) id triple
    fn score(&self, head: usize, relation: usize, tail: usize) -> f32;

    /// Accumulate the scaled score gradient for one triple
    fn backward(
        &self,
        head: usize,
        relation: usize,
        tail: usize,
        upstream: f32,
        grads: &mut Gradients,
    );

    /// Parameter tables for the optimizer step
    fn params_mut(&mut self) -> ParamsMut<'_>;
}

fn init_table(rows: usize, dim: usize, rng: &mut StdRng) -> Array2<f32> {
    let bound = 6.0 / (dim as f32).sqrt();
    Array2::from_shape_fn((rows, dim), |_| (rng.gen::<f32>() - 0.5) * 2.0 * bound)
}

// ============================================================================
// DistMult
// ============================================================================

/// Bilinear diagonal model: score = Σ_d h_d · r_d · t_d
#[derive(Debug, Clone)]
pub struct DistMult {
    entities: Array2<f32>,
    relations: Array2<f32>,
}

impl DistMult {
    /// Create with seeded random tables
    pub fn new(num_entities: usize, num_relations: usize, dim: usize, rng: &mut StdRng) -> Self {
        Self {
            entities: init_table(num_entities, dim, rng),
            relations: init_table(num_relations, dim, rng),
        }
    }

    /// Create from existing tables
    pub fn from_tables(entities: Array2<f32>, relations: Array2<f32>) -> Self {
        Self {
            entities,
            relations,
        }
    }
}

impl EmbeddingModel for DistMult {
    fn name(&self) -> &'static str {
        "DistMult"
    }

    fn num_entities(&self) -> usize {
        self.entities.nrows()
    }

    fn num_relations(&self) -> usize {
        self.relations.nrows()
    }

    fn dim(&self) -> usize {
        self.entities.ncols()
    }

    fn score(&self, head: usize, relation: usize, tail: usize) -> f32 {
        let h = self.entities.row(head);
        let r = self.relations.row(relation);
        let t = self.entities.row(tail);

        (0..self.dim()).map(|d| h[d] * r[d] * t[d]).sum()
    }

    fn backward(
        &self,
        head: usize,
        relation: usize,
        tail: usize,
        upstream: f32,
        grads: &mut Gradients,
    ) {
        for d in 0..self.dim() {
            let h = self.entities[[head, d]];
            let r = self.relations[[relation, d]];
            let t = self.entities[[tail, d]];

            grads.entities[[head, d]] += upstream * r * t;
            grads.relations[[relation, d]] += upstream * h * t;
            grads.entities[[tail, d]] += upstream * h * r;
        }
    }

    fn params_mut(&mut self) -> ParamsMut<'_> {
        ParamsMut {
            entities: &mut self.entities,
            relations: &mut self.relations,
        }
    }
}

// ============================================================================
// TransE
// ============================================================================

/// Translational model: score = −‖h + r − t‖₁
///
/// True triples make head + relation land near tail, so higher (less
/// negative) scores are more plausible.
#[derive(Debug, Clone)]
pub struct TransE {
    entities: Array2<f32>,
    relations: Array2<f32>,
}

impl TransE {
    /// Create with seeded random tables
    pub fn new(num_entities: usize, num_relations: usize, dim: usize, rng: &mut StdRng) -> Self {
        Self {
            entities: init_table(num_entities, dim, rng),
            relations: init_table(num_relations, dim, rng),
        }
    }

    /// Create from existing tables
    pub fn from_tables(entities: Array2<f32>, relations: Array2<f32>) -> Self {
        Self {
            entities,
            relations,
        }
    }
}

impl EmbeddingModel for TransE {
    fn name(&self) -> &'static str {
        "TransE"
    }

    fn num_entities(&self) -> usize {
        self.entities.nrows()
    }

    fn num_relations(&self) -> usize {
        self.relations.nrows()
    }

    fn dim(&self) -> usize {
        self.entities.ncols()
    }

    fn score(&self, head: usize, relation: usize, tail: usize) -> f32 {
        let h = self.entities.row(head);
        let r = self.relations.row(relation);
        let t = self.entities.row(tail);

        -(0..self.dim()).map(|d| (h[d] + r[d] - t[d]).abs()).sum::<f32>()
    }

    fn backward(
        &self,
        head: usize,
        relation: usize,
        tail: usize,
        upstream: f32,
        grads: &mut Gradients,
    ) {
        for d in 0..self.dim() {
            let diff =
                self.entities[[head, d]] + self.relations[[relation, d]] - self.entities[[tail, d]];
            // Subgradient of |x| with 0 at the kink
            let sign = if diff > 0.0 {
                1.0
            } else if diff < 0.0 {
                -1.0
            } else {
                0.0
            };

            grads.entities[[head, d]] += upstream * -sign;
            grads.relations[[relation, d]] += upstream * -sign;
            grads.entities[[tail, d]] += upstream * sign;
        }
    }

    fn params_mut(&mut self) -> ParamsMut<'_> {
        ParamsMut {
            entities: &mut self.entities,
            relations: &mut self.relations,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
