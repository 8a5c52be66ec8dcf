//! Upsert-by-composite-key long-term memory store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use recall_core::{
    Interaction, LongTermMemoryStore, MemoryFilter, MemoryItem, MemoryKind, Page,
    RelationshipMemory, StorageError,
};

type ItemKey = (String, Option<String>, MemoryKind, String);

fn item_key(item: &MemoryItem) -> ItemKey {
    (
        item.subject_id.clone(),
        item.character_id.clone(),
        item.kind,
        item.key.clone(),
    )
}

/// In-memory [`LongTermMemoryStore`].
pub struct InMemoryLongTermStore {
    items: RwLock<HashMap<ItemKey, MemoryItem>>,
    relationships: RwLock<HashMap<(String, String), RelationshipMemory>>,
}

impl InMemoryLongTermStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            relationships: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored memory items (all subjects).
    pub async fn item_count(&self) -> usize {
        self.items.read().await.len()
    }
}

impl Default for InMemoryLongTermStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LongTermMemoryStore for InMemoryLongTermStore {
    async fn upsert(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        let key = item_key(&item);
        let mut items = self.items.write().await;
        let stored = match items.get_mut(&key) {
            Some(existing) => {
                existing.value = item.value;
                existing.confidence = item.confidence;
                existing.importance = item.importance;
                existing.source = item.source;
                existing.tags = item.tags;
                existing.updated_at = Utc::now();
                existing.access_count += 1;
                debug!(
                    subject_id = %existing.subject_id,
                    key = %existing.key,
                    access_count = existing.access_count,
                    "Merged memory item into existing row"
                );
                existing.clone()
            }
            None => {
                items.insert(key, item.clone());
                debug!(subject_id = %item.subject_id, key = %item.key, "Inserted memory item");
                item
            }
        };
        Ok(stored)
    }

    async fn query(
        &self,
        subject_id: &str,
        filter: MemoryFilter,
        page: Page,
    ) -> Result<Vec<MemoryItem>, StorageError> {
        let items = self.items.read().await;
        let mut results: Vec<MemoryItem> = items
            .values()
            .filter(|item| item.subject_id == subject_id && filter.matches(item))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(results
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
        let mut relationships = self.relationships.write().await;
        let relationship = relationships
            .entry((subject_id.to_string(), related_id.to_string()))
            .or_insert_with(|| RelationshipMemory::new(subject_id, related_id));
        relationship.apply_interaction(interaction, "new interaction evidence");
        Ok(relationship.clone())
    }

    async fn get_relationship(
        &self,
        subject_id: &str,
        related_id: &str,
    ) -> Result<Option<RelationshipMemory>, StorageError> {
        let relationships = self.relationships.read().await;
        Ok(relationships
            .get(&(subject_id.to_string(), related_id.to_string()))
            .cloned())
    }

    async fn delete_for_subject(&self, subject_id: &str) -> Result<u64, StorageError> {
        let mut removed = 0u64;
        {
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|_, item| item.subject_id != subject_id);
            removed += (before - items.len()) as u64;
        }
        {
            let mut relationships = self.relationships.write().await;
            let before = relationships.len();
            relationships.retain(|_, rel| rel.subject_id != subject_id);
            removed += (before - relationships.len()) as u64;
        }
        debug!(subject_id, removed, "Deleted all memories for subject");
        Ok(removed)
    }
}
