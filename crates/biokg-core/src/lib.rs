//! biokg Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the biokg system:
//! - Relation triples extracted from biomedical text
//! - Common error types
//! - The proposer trait (LLM that suggests raw triples for a text span)
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LlmConfig, LlmProvider, RefineConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for biokg operations
#[derive(Error, Debug)]
pub enum BiokgError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BiokgError>;

// ============================================================================
// Relation Triples
// ============================================================================

/// A relation triple (subject, predicate, object) extracted from text.
///
/// Fields are trimmed strings; two triples are the same candidate iff all
/// three fields compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Subject entity name
    pub subject: String,

    /// Predicate (relation) name
    pub predicate: String,

    /// Object entity name
    pub object: String,
}

impl Triple {
    /// Create a new triple
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for triple proposers (text-generation models)
///
/// A proposer receives an extraction prompt for one text span and replies
/// with a single string of candidate triples. Parsing the reply is the
/// caller's concern; a proposer makes no format guarantees.
#[async_trait::async_trait]
pub trait Proposer: Send + Sync {
    /// Propose raw triples for the given prompt
    async fn propose(&self, prompt: &str) -> Result<String>;

    /// Get proposer name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_triple_equality() {
        let a = Triple::new("Aspirin", "treats", "headache");
        let b = Triple::new("Aspirin", "treats", "headache");
        let c = Triple::new("Aspirin", "treats", "fever");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_triple_set_semantics() {
        let mut set = HashSet::new();
        set.insert(Triple::new("Aspirin", "treats", "headache"));
        set.insert(Triple::new("Aspirin", "treats", "headache"));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_triple_display() {
        let t = Triple::new("Aspirin", "treats", "headache");
        assert_eq!(t.to_string(), "(Aspirin, treats, headache)");
    }
}
