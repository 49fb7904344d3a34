//! SurrealDB implementation of the graph sink
//!
//! Provides connection management and idempotent upserts for entity
//! nodes and predicate-carrying relationships. Record ids are derived
//! from the name strings, so re-ingesting the same triple merges into
//! the existing records instead of duplicating them.

use async_trait::async_trait;
use biokg_core::{BiokgError, DatabaseConfig, Result};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

/// SurrealDB graph sink
pub struct SurrealSink {
    client: Surreal<Client>,
}

impl SurrealSink {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // Remove ws:// or wss:// prefix if present (surrealdb crate adds it automatically)
        let url = config
            .surrealdb_url
            .strip_prefix("ws://")
            .or_else(|| config.surrealdb_url.strip_prefix("wss://"))
            .unwrap_or(&config.surrealdb_url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| BiokgError::Database(format!("SurrealDB connection failed: {e}")))?;

        client
            .signin(Root {
                username: &config.surrealdb_user,
                password: &config.surrealdb_pass,
            })
            .await
            .map_err(|e| BiokgError::Database(format!("SurrealDB auth failed: {e}")))?;

        client
            .use_ns(&config.surrealdb_namespace)
            .use_db(&config.surrealdb_database)
            .await
            .map_err(|e| BiokgError::Database(format!("SurrealDB namespace error: {e}")))?;

        Ok(Self { client })
    }

    /// Initialize schema (run once on setup)
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE entity SCHEMAFULL;
                DEFINE FIELD name ON entity TYPE string;
                DEFINE FIELD kind ON entity TYPE string;
                DEFINE INDEX idx_entity_name ON entity FIELDS name UNIQUE;
                DEFINE TABLE relates SCHEMAFULL;
                DEFINE FIELD source ON relates TYPE record<entity>;
                DEFINE FIELD target ON relates TYPE record<entity>;
                DEFINE FIELD predicate ON relates TYPE string;
                DEFINE INDEX idx_relates_key ON relates FIELDS source, target, predicate UNIQUE;
            "#,
            )
            .await
            .map_err(|e| BiokgError::Database(format!("Schema init failed: {e}")))?;

        Ok(())
    }

    /// Deterministic record id for a key string
    fn record_id(key: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

#[async_trait]
impl super::GraphSink for SurrealSink {
    async fn upsert(
        &self,
        subject_kind: &str,
        subject: &str,
        predicate: &str,
        object_kind: &str,
        object: &str,
    ) -> Result<()> {
        let subject_id = Self::record_id(subject);
        let object_id = Self::record_id(object);
        let edge_id = Self::record_id(&format!("{subject}\u{1}{predicate}\u{1}{object}"));

        self.client
            .query(
                r#"
                UPSERT type::thing('entity', $subject_id)
                    SET name = $subject, kind = $subject_kind;
                UPSERT type::thing('entity', $object_id)
                    SET name = $object, kind = $object_kind;
                UPSERT type::thing('relates', $edge_id)
                    SET source = type::thing('entity', $subject_id),
                        target = type::thing('entity', $object_id),
                        predicate = $predicate;
            "#,
            )
            .bind(("subject_id", subject_id))
            .bind(("object_id", object_id))
            .bind(("edge_id", edge_id))
            .bind(("subject", subject.to_string()))
            .bind(("subject_kind", subject_kind.to_string()))
            .bind(("object", object.to_string()))
            .bind(("object_kind", object_kind.to_string()))
            .bind(("predicate", predicate.to_string()))
            .await
            .map_err(|e| BiokgError::Database(format!("Failed to upsert triple: {e}")))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "surrealdb"
    }
}

// ============================================================================
// Tests
// ============================================================================
