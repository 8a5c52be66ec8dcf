//! Memory extractor trait.
//!
//! Implemented by the model-backed primary extractor and the rule-based
//! fallback. Extractors are stateless over their input: same messages,
//! same subject, same candidate items (modulo generated ids/timestamps).

use async_trait::async_trait;
use recall_core::{MemoryItem, Message};

/// Extracts candidate long-term memory items from a batch of messages.
///
/// Items returned here are candidates; the pipeline's validation step
/// decides what actually reaches the store.
#[async_trait]
pub trait MemoryExtractor: Send + Sync {
    /// Stable facts about the subject (name, location, occupation, ...).
    async fn extract_facts(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error>;

    /// Likes, dislikes and other preferences.
    async fn extract_preferences(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error>;

    /// Remembered moments and events.
    async fn extract_episodic(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error>;

    /// Memories scoped to the subject's interactions with one character;
    /// returned items carry `character_id`.
    async fn extract_character_memories(
        &self,
        subject_id: &str,
        character_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error>;

    /// Memories a character keeps about a scene; the character is the
    /// subject, the scene id is carried in the item key and tags.
    async fn extract_scene_memories(
        &self,
        character_id: &str,
        scene_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error>;
}
