//! biokg KGE - Embedding-based triple refinement
//!
//! Implements the adversarial refinement stage of the pipeline:
//! - Entity/relation indexing over the candidate triple set
//! - Two embedding scorers (DistMult generator, TransE discriminator)
//! - Margin-based pretraining and adversarial co-training
//! - Discriminator-threshold filtering with placeholder recall/F1

pub mod index;
pub mod models;
pub mod optim;
pub mod refine;
pub mod trainer;

pub use index::{dedup_triples, GraphIndex, IndexedTriple};
pub use models::{DistMult, EmbeddingModel, Gradients, TransE};
pub use optim::Adam;
pub use refine::{refine, RefinementReport};
pub use trainer::AdversarialTrainer;
