//! Context assembly: snapshot read + strategy dispatch.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, instrument, warn};

use recall_core::{
    OptimizedContext, ReadSelector, SessionType, ShortTermStore, StrategyKind,
};
use recall_strategies::StrategyRegistry;

/// Turns a session's raw history into a token-budgeted context.
///
/// Assembly is a read-only operation over a snapshot taken at call time:
/// it may run concurrently with in-flight appends to the same session and
/// produce a best-effort-current result, which is acceptable because it
/// only feeds the next model call.
pub struct ContextAssembler {
    short_term: Arc<dyn ShortTermStore>,
    registry: StrategyRegistry,
}

impl ContextAssembler {
    pub fn new(short_term: Arc<dyn ShortTermStore>, registry: StrategyRegistry) -> Self {
        Self {
            short_term,
            registry,
        }
    }

    /// Assembles a context for the session. `strategy` overrides the
    /// session-type default; `query` feeds relevance ranking (the latest
    /// user message is used when absent). An absent or empty session
    /// yields an empty context, not an error.
    #[instrument(skip(self, query))]
    pub async fn assemble(
        &self,
        session_id: &str,
        session_type: SessionType,
        token_budget: usize,
        strategy: Option<StrategyKind>,
        query: Option<&str>,
    ) -> Result<OptimizedContext, anyhow::Error> {
        let kind = strategy.unwrap_or_else(|| StrategyKind::for_session_type(session_type));
        let strategy = self
            .registry
            .get(kind)
            .ok_or_else(|| anyhow!("no strategy registered for {kind:?}"))?;

        let snapshot = self.short_term.read(session_id, ReadSelector::All).await?;
        if snapshot.is_empty() {
            debug!(session_id, "Empty history, returning empty context");
            return Ok(OptimizedContext::empty(kind));
        }

        let context = strategy.optimize(&snapshot, token_budget, query).await?;

        debug!(
            session_id,
            strategy = kind.name(),
            original_messages = context.original_message_count,
            optimized_messages = context.optimized_message_count,
            original_tokens = context.original_token_count,
            optimized_tokens = context.optimized_token_count,
            dropped = context.dropped_message_count,
            "Assembled context"
        );
        if context.over_budget {
            // budget violations are flagged on the result, never an error
            warn!(
                session_id,
                token_budget,
                optimized_tokens = context.optimized_token_count,
                "Assembled context exceeds the requested budget"
            );
        }

        Ok(context)
    }
}
