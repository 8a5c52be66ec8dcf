//! Shared test utilities for extraction integration tests.

use std::time::Duration;

use async_trait::async_trait;
use recall_core::{MemoryItem, Message, MessageRole, ModelClient};
use recall_extraction::MemoryExtractor;

/// Model client returning a canned reply.
#[allow(dead_code)]
pub struct MockModelClient {
    pub reply: String,
}

#[allow(dead_code)]
impl MockModelClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, _prompt: &str, _deadline: Duration) -> Result<String, anyhow::Error> {
        Ok(self.reply.clone())
    }
}

/// Model client that always fails (unreachable provider / exceeded deadline).
#[allow(dead_code)]
pub struct FailingModelClient;

#[async_trait]
impl ModelClient for FailingModelClient {
    async fn complete(&self, _prompt: &str, _deadline: Duration) -> Result<String, anyhow::Error> {
        Err(anyhow::anyhow!("model unavailable"))
    }
}

/// Extractor that fails in every category; used to exercise the
/// fallback-failure path.
#[allow(dead_code)]
pub struct BrokenExtractor;

#[async_trait]
impl MemoryExtractor for BrokenExtractor {
    async fn extract_facts(
        &self,
        _subject_id: &str,
        _messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        Err(anyhow::anyhow!("boom"))
    }

    async fn extract_preferences(
        &self,
        _subject_id: &str,
        _messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        Err(anyhow::anyhow!("boom"))
    }

    async fn extract_episodic(
        &self,
        _subject_id: &str,
        _messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        Err(anyhow::anyhow!("boom"))
    }

    async fn extract_character_memories(
        &self,
        _subject_id: &str,
        _character_id: &str,
        _messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        Err(anyhow::anyhow!("boom"))
    }

    async fn extract_scene_memories(
        &self,
        _character_id: &str,
        _scene_id: &str,
        _messages: &[Message],
    ) -> Result<Vec<MemoryItem>, anyhow::Error> {
        Err(anyhow::anyhow!("boom"))
    }
}

#[allow(dead_code)]
pub fn user(content: &str) -> Message {
    Message::new("s1", MessageRole::User, content)
}
