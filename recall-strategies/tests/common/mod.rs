//! Shared test utilities for strategy integration tests.
//!
//! Provides mock model clients and message builders used by the strategy
//! test files under tests/.

use std::time::Duration;

use async_trait::async_trait;
use recall_core::{Message, MessageRole, ModelClient};

/// Mock model client: returns a fixed reply for any prompt. Used by
/// summarization tests without calling external model APIs.
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

/// Model client that always fails, simulating an unreachable provider or
/// an exceeded deadline.
#[allow(dead_code)]
pub struct FailingModelClient;

#[async_trait]
impl ModelClient for FailingModelClient {
    async fn complete(&self, _prompt: &str, _deadline: Duration) -> Result<String, anyhow::Error> {
        Err(anyhow::anyhow!("model unavailable"))
    }
}

/// User message with a fixed provider-supplied token count.
#[allow(dead_code)]
pub fn user(content: &str, tokens: u32) -> Message {
    Message::new("s1", MessageRole::User, content).with_token_estimate(tokens)
}

/// Assistant message with a fixed provider-supplied token count.
#[allow(dead_code)]
pub fn assistant(content: &str, tokens: u32) -> Message {
    Message::new("s1", MessageRole::Assistant, content).with_token_estimate(tokens)
}

/// System message with a fixed provider-supplied token count.
#[allow(dead_code)]
pub fn system(content: &str, tokens: u32) -> Message {
    Message::new("s1", MessageRole::System, content).with_token_estimate(tokens)
}
