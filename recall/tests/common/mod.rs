//! Shared test utilities for engine integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use recall::{EngineConfig, MemoryEngine};
use recall_core::{Message, MessageRole, ModelClient};
use recall_inmemory::{InMemoryLongTermStore, InMemoryShortTermStore};

/// Model client returning a fixed short reply; good enough for summaries.
pub struct MockModelClient;

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, _prompt: &str, _deadline: Duration) -> Result<String, anyhow::Error> {
        Ok("Short recap of the earlier conversation.\n- a key point".to_string())
    }
}

/// Engine wired to in-memory stores and the mock model, with model
/// extraction off so extraction tests are deterministic.
#[allow(dead_code)]
pub fn engine() -> MemoryEngine {
    let config = EngineConfig {
        enable_model_extraction: false,
        ..EngineConfig::default()
    };
    MemoryEngine::new(
        Arc::new(InMemoryShortTermStore::new()),
        Arc::new(InMemoryLongTermStore::new()),
        Arc::new(MockModelClient),
        config,
    )
}

#[allow(dead_code)]
pub fn user(session_id: &str, content: &str, tokens: u32) -> Message {
    Message::new(session_id, MessageRole::User, content).with_token_estimate(tokens)
}

#[allow(dead_code)]
pub fn system(session_id: &str, content: &str, tokens: u32) -> Message {
    Message::new(session_id, MessageRole::System, content).with_token_estimate(tokens)
}
