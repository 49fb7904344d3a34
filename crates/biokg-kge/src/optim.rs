//! Adam optimizer over embedding tables
//!
//! One optimizer instance per model; generator and discriminator steps
//! are applied strictly in sequence by the trainer.

use ndarray::{Array2, Zip};

use crate::models::{EmbeddingModel, Gradients};

/// Adam with bias correction (β₁ = 0.9, β₂ = 0.999, ε = 1e-8)
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    steps: u64,
    m_entities: Array2<f32>,
    v_entities: Array2<f32>,
    m_relations: Array2<f32>,
    v_relations: Array2<f32>,
}

impl Adam {
    /// Create an optimizer with moment buffers shaped for the model
    pub fn new(model: &dyn EmbeddingModel, learning_rate: f32) -> Self {
        let entity_shape = (model.num_entities(), model.dim());
        let relation_shape = (model.num_relations(), model.dim());

        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            steps: 0,
            m_entities: Array2::zeros(entity_shape),
            v_entities: Array2::zeros(entity_shape),
            m_relations: Array2::zeros(relation_shape),
            v_relations: Array2::zeros(relation_shape),
        }
    }

    /// Apply one update from accumulated gradients
    pub fn step(&mut self, model: &mut dyn EmbeddingModel, grads: &Gradients) {
        self.steps += 1;
        let bias1 = 1.0 - self.beta1.powi(self.steps as i32);
        let bias2 = 1.0 - self.beta2.powi(self.steps as i32);

        let params = model.params_mut();
        update_table(
            params.entities,
            &mut self.m_entities,
            &mut self.v_entities,
            &grads.entities,
            self.learning_rate,
            self.beta1,
            self.beta2,
            self.eps,
            bias1,
            bias2,
        );
        update_table(
            params.relations,
            &mut self.m_relations,
            &mut self.v_relations,
            &grads.relations,
            self.learning_rate,
            self.beta1,
            self.beta2,
            self.eps,
            bias1,
            bias2,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn update_table(
    weights: &mut Array2<f32>,
    m: &mut Array2<f32>,
    v: &mut Array2<f32>,
    grads: &Array2<f32>,
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    bias1: f32,
    bias2: f32,
) {
    Zip::from(weights)
        .and(m)
        .and(v)
        .and(grads)
        .for_each(|w, m, v, &g| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *w -= learning_rate * m_hat / (v_hat.sqrt() + eps);
        });
}

// ============================================================================
// Tests
// ============================================================================
