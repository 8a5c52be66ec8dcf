//! Generative-model call contract.
//!
//! The engine never talks to a provider directly; summarization and the
//! primary memory extractor go through this trait. Implementations live
//! outside the engine (the provider integration is a consumed
//! collaborator).

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Minimal completion interface used by summarization and primary
/// extraction.
///
/// Implementations MUST honor `deadline`: a call that cannot finish in
/// time returns an error instead of blocking. Callers treat a deadline
/// overrun exactly like any other model failure (fallback / summary
/// unavailable).
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns the model completion for `prompt`, failing once `deadline`
    /// elapses.
    async fn complete(&self, prompt: &str, deadline: Duration) -> Result<String>;
}
