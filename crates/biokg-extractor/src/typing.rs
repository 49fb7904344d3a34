//! Entity typing for graph node labels
//!
//! Keyword-based coarse typing. The kind only selects the node label at
//! persistence time; training and scoring never look at it.

use serde::{Deserialize, Serialize};

const DRUG_KEYWORDS: [&str; 3] = ["drug", "med", "compound"];
const DISEASE_KEYWORDS: [&str; 3] = ["disease", "symptom", "condition"];

/// Coarse entity category used as the graph node label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Drug,
    Disease,
    Entity,
}

impl EntityKind {
    /// Classify an entity name by case-insensitive keyword match.
    ///
    /// Drug keywords win over disease keywords; no match falls back to
    /// the generic kind.
    pub fn classify(entity: &str) -> Self {
        let lowered = entity.to_lowercase();

        if DRUG_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            Self::Drug
        } else if DISEASE_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            Self::Disease
        } else {
            Self::Entity
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drug => "Drug",
            Self::Disease => "Disease",
            Self::Entity => "Entity",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
