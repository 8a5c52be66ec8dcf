//! # SQLite Long-Term Store
//!
//! SQLite-based implementation of the `LongTermMemoryStore` trait.
//!
//! **Advantages**:
//! - Persistent storage (data survives restarts)
//! - Good balance of performance and simplicity
//! - No external database required
//!
//! **Limitations**:
//! - Single-file database (can become large)
//! - Filtered scans load the subject's rows before filtering in memory
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE memory_items (
//!     id TEXT PRIMARY KEY,
//!     kind TEXT NOT NULL,
//!     subject_id TEXT NOT NULL,
//!     character_id TEXT,
//!     key TEXT NOT NULL,
//!     value TEXT NOT NULL,
//!     confidence REAL NOT NULL,
//!     importance REAL NOT NULL,
//!     source TEXT NOT NULL,
//!     tags TEXT NOT NULL,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     access_count INTEGER NOT NULL
//! );
//!
//! CREATE TABLE relationships (
//!     subject_id TEXT NOT NULL,
//!     related_id TEXT NOT NULL,
//!     relationship_type TEXT NOT NULL,
//!     strength REAL NOT NULL,
//!     interactions TEXT NOT NULL,
//!     changes TEXT NOT NULL,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     PRIMARY KEY (subject_id, related_id)
//! );
//! ```
//!
//! Interaction and change histories are stored as JSON columns; the
//! bounded-history and strength-update semantics live on
//! `RelationshipMemory` itself so every backend behaves identically.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use recall_core::{
    Interaction, LongTermMemoryStore, MemoryFilter, MemoryItem, MemoryKind, MemorySource, Page,
    RelationshipMemory, RelationshipType, StorageError,
};

/// SQLite-backed [`LongTermMemoryStore`].
#[derive(Clone)]
pub struct SqliteLongTermStore {
    pool: SqlitePool,
}

fn backend_err(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn serde_err(e: serde_json::Error) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn kind_to_str(kind: MemoryKind) -> &'static str {
    match kind {
        MemoryKind::Fact => "Fact",
        MemoryKind::Preference => "Preference",
        MemoryKind::Episodic => "Episodic",
    }
}

fn kind_from_str(s: &str) -> Result<MemoryKind, StorageError> {
    match s {
        "Fact" => Ok(MemoryKind::Fact),
        "Preference" => Ok(MemoryKind::Preference),
        "Episodic" => Ok(MemoryKind::Episodic),
        other => Err(StorageError::Serialization(format!("unknown kind: {other}"))),
    }
}

fn source_to_str(source: MemorySource) -> &'static str {
    match source {
        MemorySource::Model => "Model",
        MemorySource::Rule => "Rule",
        MemorySource::Manual => "Manual",
    }
}

fn source_from_str(s: &str) -> Result<MemorySource, StorageError> {
    match s {
        "Model" => Ok(MemorySource::Model),
        "Rule" => Ok(MemorySource::Rule),
        "Manual" => Ok(MemorySource::Manual),
        other => Err(StorageError::Serialization(format!("unknown source: {other}"))),
    }
}

fn type_to_str(t: RelationshipType) -> &'static str {
    match t {
        RelationshipType::Stranger => "Stranger",
        RelationshipType::Acquaintance => "Acquaintance",
        RelationshipType::Friend => "Friend",
        RelationshipType::Close => "Close",
        RelationshipType::Companion => "Companion",
    }
}

fn type_from_str(s: &str) -> Result<RelationshipType, StorageError> {
    match s {
        "Stranger" => Ok(RelationshipType::Stranger),
        "Acquaintance" => Ok(RelationshipType::Acquaintance),
        "Friend" => Ok(RelationshipType::Friend),
        "Close" => Ok(RelationshipType::Close),
        "Companion" => Ok(RelationshipType::Companion),
        other => Err(StorageError::Serialization(format!(
            "unknown relationship type: {other}"
        ))),
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp: {e}")))
}

impl SqliteLongTermStore {
    /// Opens (creating if missing) the database file and initializes the
    /// schema.
    pub async fn new(database_path: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_path);

        let pool = SqlitePool::connect_with(options).await.map_err(backend_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_items (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                character_id TEXT,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                confidence REAL NOT NULL,
                importance REAL NOT NULL,
                source TEXT NOT NULL,
                tags TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                access_count INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_subject ON memory_items(subject_id);
            CREATE INDEX IF NOT EXISTS idx_items_updated ON memory_items(updated_at);

            CREATE TABLE IF NOT EXISTS relationships (
                subject_id TEXT NOT NULL,
                related_id TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                strength REAL NOT NULL,
                interactions TEXT NOT NULL,
                changes TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (subject_id, related_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend_err)?;

        Ok(())
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryItem, StorageError> {
        let id: String = row.try_get("id").map_err(backend_err)?;
        let kind: String = row.try_get("kind").map_err(backend_err)?;
        let subject_id: String = row.try_get("subject_id").map_err(backend_err)?;
        let character_id: Option<String> = row.try_get("character_id").map_err(backend_err)?;
        let key: String = row.try_get("key").map_err(backend_err)?;
        let value: String = row.try_get("value").map_err(backend_err)?;
        let confidence: f64 = row.try_get("confidence").map_err(backend_err)?;
        let importance: f64 = row.try_get("importance").map_err(backend_err)?;
        let source: String = row.try_get("source").map_err(backend_err)?;
        let tags: String = row.try_get("tags").map_err(backend_err)?;
        let created_at: String = row.try_get("created_at").map_err(backend_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(backend_err)?;
        let access_count: i64 = row.try_get("access_count").map_err(backend_err)?;

        Ok(MemoryItem {
            id: Uuid::from_str(&id)
                .map_err(|e| StorageError::Serialization(format!("bad id: {e}")))?,
            kind: kind_from_str(&kind)?,
            subject_id,
            character_id,
            key,
            value,
            confidence: confidence as f32,
            importance: importance as f32,
            source: source_from_str(&source)?,
            tags: serde_json::from_str(&tags).map_err(serde_err)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
            access_count: access_count as u32,
        })
    }

    fn row_to_relationship(row: &sqlx::sqlite::SqliteRow) -> Result<RelationshipMemory, StorageError> {
        let subject_id: String = row.try_get("subject_id").map_err(backend_err)?;
        let related_id: String = row.try_get("related_id").map_err(backend_err)?;
        let relationship_type: String = row.try_get("relationship_type").map_err(backend_err)?;
        let strength: f64 = row.try_get("strength").map_err(backend_err)?;
        let interactions: String = row.try_get("interactions").map_err(backend_err)?;
        let changes: String = row.try_get("changes").map_err(backend_err)?;
        let created_at: String = row.try_get("created_at").map_err(backend_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(backend_err)?;

        Ok(RelationshipMemory {
            subject_id,
            related_id,
            relationship_type: type_from_str(&relationship_type)?,
            strength: strength as f32,
            interactions: serde_json::from_str(&interactions).map_err(serde_err)?,
            changes: serde_json::from_str(&changes).map_err(serde_err)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    async fn save_relationship(&self, relationship: &RelationshipMemory) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO relationships
                (subject_id, related_id, relationship_type, strength,
                 interactions, changes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&relationship.subject_id)
        .bind(&relationship.related_id)
        .bind(type_to_str(relationship.relationship_type))
        .bind(relationship.strength as f64)
        .bind(serde_json::to_string(&relationship.interactions).map_err(serde_err)?)
        .bind(serde_json::to_string(&relationship.changes).map_err(serde_err)?)
        .bind(relationship.created_at.to_rfc3339())
        .bind(relationship.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_err)?;
        Ok(())
    }
}

#[async_trait]
impl LongTermMemoryStore for SqliteLongTermStore {
    async fn upsert(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        // `IS ?` gives null-safe equality for the optional character scope
        let existing = sqlx::query(
            r#"
            SELECT * FROM memory_items
            WHERE subject_id = ? AND character_id IS ? AND kind = ? AND key = ?
            "#,
        )
        .bind(&item.subject_id)
        .bind(&item.character_id)
        .bind(kind_to_str(item.kind))
        .bind(&item.key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        match existing {
            Some(row) => {
                let mut merged = Self::row_to_item(&row)?;
                merged.value = item.value;
                merged.confidence = item.confidence;
                merged.importance = item.importance;
                merged.source = item.source;
                merged.tags = item.tags;
                merged.updated_at = Utc::now();
                merged.access_count += 1;

                sqlx::query(
                    r#"
                    UPDATE memory_items
                    SET value = ?, confidence = ?, importance = ?, source = ?,
                        tags = ?, updated_at = ?, access_count = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&merged.value)
                .bind(merged.confidence as f64)
                .bind(merged.importance as f64)
                .bind(source_to_str(merged.source))
                .bind(serde_json::to_string(&merged.tags).map_err(serde_err)?)
                .bind(merged.updated_at.to_rfc3339())
                .bind(merged.access_count as i64)
                .bind(merged.id.to_string())
                .execute(&self.pool)
                .await
                .map_err(backend_err)?;

                debug!(
                    subject_id = %merged.subject_id,
                    key = %merged.key,
                    access_count = merged.access_count,
                    "Merged memory item into existing row"
                );
                Ok(merged)
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO memory_items
                        (id, kind, subject_id, character_id, key, value, confidence,
                         importance, source, tags, created_at, updated_at, access_count)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(item.id.to_string())
                .bind(kind_to_str(item.kind))
                .bind(&item.subject_id)
                .bind(&item.character_id)
                .bind(&item.key)
                .bind(&item.value)
                .bind(item.confidence as f64)
                .bind(item.importance as f64)
                .bind(source_to_str(item.source))
                .bind(serde_json::to_string(&item.tags).map_err(serde_err)?)
                .bind(item.created_at.to_rfc3339())
                .bind(item.updated_at.to_rfc3339())
                .bind(item.access_count as i64)
                .execute(&self.pool)
                .await
                .map_err(backend_err)?;

                debug!(subject_id = %item.subject_id, key = %item.key, "Inserted memory item");
                Ok(item)
            }
        }
    }

    async fn query(
        &self,
        subject_id: &str,
        filter: MemoryFilter,
        page: Page,
    ) -> Result<Vec<MemoryItem>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM memory_items
            WHERE subject_id = ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;

        let mut items = Vec::new();
        for row in &rows {
            let item = Self::row_to_item(row)?;
            if filter.matches(&item) {
                items.push(item);
            }
        }
        Ok(items
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn record_interaction(
        &self,
        subject_id: &str,
        related_id: &str,
        interaction: Interaction,
    ) -> Result<RelationshipMemory, StorageError> {
        let mut relationship = self
            .get_relationship(subject_id, related_id)
            .await?
            .unwrap_or_else(|| RelationshipMemory::new(subject_id, related_id));

        relationship.apply_interaction(interaction, "new interaction evidence");
        self.save_relationship(&relationship).await?;
        Ok(relationship)
    }

    async fn get_relationship(
        &self,
        subject_id: &str,
        related_id: &str,
    ) -> Result<Option<RelationshipMemory>, StorageError> {
        let row = sqlx::query(
            r#"SELECT * FROM relationships WHERE subject_id = ? AND related_id = ?"#,
        )
        .bind(subject_id)
        .bind(related_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.map(|r| Self::row_to_relationship(&r)).transpose()
    }

    async fn delete_for_subject(&self, subject_id: &str) -> Result<u64, StorageError> {
        let items = sqlx::query(r#"DELETE FROM memory_items WHERE subject_id = ?"#)
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        let relationships = sqlx::query(r#"DELETE FROM relationships WHERE subject_id = ?"#)
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;

        let removed = items.rows_affected() + relationships.rows_affected();
        debug!(subject_id, removed, "Deleted all memories for subject");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (SqliteLongTermStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.db");
        let store = SqliteLongTermStore::new(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    fn fact(subject: &str, key: &str, value: &str, confidence: f32) -> MemoryItem {
        MemoryItem::new(MemoryKind::Fact, subject, key, value, MemorySource::Rule)
            .with_confidence(confidence)
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_merges() {
        let (store, _dir) = store().await;

        let first = store.upsert(fact("u1", "name", "Ada", 0.6)).await.unwrap();
        assert_eq!(first.access_count, 0);

        let merged = store.upsert(fact("u1", "name", "Ada Lovelace", 0.9)).await.unwrap();
        assert_eq!(merged.value, "Ada Lovelace");
        assert_eq!(merged.confidence, 0.9);
        assert_eq!(merged.access_count, 1);
        assert_eq!(merged.id, first.id);

        let items = store
            .query("u1", MemoryFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_character_scope_is_a_separate_row() {
        let (store, _dir) = store().await;
        store.upsert(fact("u1", "name", "Ada", 0.8)).await.unwrap();
        store
            .upsert(fact("u1", "name", "Captain", 0.8).with_character("char1"))
            .await
            .unwrap();

        let all = store
            .query("u1", MemoryFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let scoped = store
            .query(
                "u1",
                MemoryFilter {
                    character_id: Some("char1".to_string()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].value, "Captain");
    }

    #[tokio::test]
    async fn test_query_filters_confidence_and_paginates() {
        let (store, _dir) = store().await;
        for i in 0..10 {
            store
                .upsert(fact("u1", &format!("k{i}"), "v", 0.5 + (i as f32) * 0.05))
                .await
                .unwrap();
        }

        let confident = store
            .query(
                "u1",
                MemoryFilter {
                    min_confidence: Some(0.8),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert!(!confident.is_empty());
        assert!(confident.iter().all(|i| i.confidence >= 0.8));

        let page = store
            .query("u1", MemoryFilter::default(), Page { offset: 2, limit: 3 })
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_fields() {
        let (store, _dir) = store().await;
        let item = MemoryItem::new(
            MemoryKind::Episodic,
            "u1",
            "moment:first-concert",
            "went to their first concert",
            MemorySource::Model,
        )
        .with_character("char1")
        .with_confidence(0.85)
        .with_importance(0.9)
        .with_tags(vec!["moment".to_string(), "music".to_string()]);

        store.upsert(item.clone()).await.unwrap();
        let found = store
            .query(
                "u1",
                MemoryFilter {
                    kind: Some(MemoryKind::Episodic),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, item.key);
        assert_eq!(found[0].tags, item.tags);
        assert_eq!(found[0].source, MemorySource::Model);
        assert_eq!(found[0].character_id.as_deref(), Some("char1"));
    }

    #[tokio::test]
    async fn test_relationship_roundtrip_and_updates() {
        let (store, _dir) = store().await;

        assert!(store.get_relationship("u1", "char1").await.unwrap().is_none());

        for _ in 0..5 {
            store
                .record_interaction("u1", "char1", Interaction::new("good talk", 0.9))
                .await
                .unwrap();
        }

        let rel = store.get_relationship("u1", "char1").await.unwrap().unwrap();
        assert_eq!(rel.interactions.len(), 5);
        assert!(rel.strength > 0.1);
        assert!(!rel.changes.is_empty());
    }

    #[tokio::test]
    async fn test_delete_for_subject_removes_everything() {
        let (store, _dir) = store().await;
        store.upsert(fact("u1", "name", "Ada", 0.8)).await.unwrap();
        store.upsert(fact("u2", "name", "Grace", 0.8)).await.unwrap();
        store
            .record_interaction("u1", "char1", Interaction::new("chat", 0.5))
            .await
            .unwrap();

        let removed = store.delete_for_subject("u1").await.unwrap();
        assert_eq!(removed, 2);

        let remaining = store
            .query("u2", MemoryFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
