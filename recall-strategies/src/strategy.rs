//! Optimization strategy trait.
//!
//! Implemented by each strategy variant; dispatched through the
//! [`crate::StrategyRegistry`]. Strategies operate on a snapshot of the
//! session history taken at call time and never touch stores directly.

use async_trait::async_trait;
use recall_core::{Message, OptimizedContext, StrategyKind};

/// A context optimization strategy.
#[async_trait]
pub trait OptimizationStrategy: Send + Sync {
    /// Which named variant this is.
    fn kind(&self) -> StrategyKind;

    /// Assembles a token-budgeted context from `messages` (the full
    /// history snapshot, in insertion order). `query` is the text to rank
    /// relevance against; strategies that need one fall back to the latest
    /// user message when it is `None`.
    async fn optimize(
        &self,
        messages: &[Message],
        token_budget: usize,
        query: Option<&str>,
    ) -> Result<OptimizedContext, anyhow::Error>;
}
