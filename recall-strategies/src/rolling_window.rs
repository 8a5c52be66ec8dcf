//! Rolling window strategy: keep the most recent messages.

use async_trait::async_trait;
use recall_core::{Message, OptimizedContext, StrategyKind};
use tracing::debug;

use crate::fill::{newest_first_fill, passthrough_if_fits, split_system, total_tokens, truncate_to_budget};
use crate::strategy::OptimizationStrategy;

/// Includes the most recent messages, newest-first fill, until adding the
/// next message would exceed the budget. Whole messages only.
#[derive(Debug, Clone, Default)]
pub struct RollingWindowStrategy;

impl RollingWindowStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OptimizationStrategy for RollingWindowStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RollingWindow
    }

    async fn optimize(
        &self,
        messages: &[Message],
        token_budget: usize,
        _query: Option<&str>,
    ) -> Result<OptimizedContext, anyhow::Error> {
        if messages.is_empty() {
            return Ok(OptimizedContext::empty(self.kind()));
        }
        if let Some(ctx) = passthrough_if_fits(self.kind(), messages, token_budget) {
            return Ok(ctx);
        }

        let (system, rest) = split_system(messages);
        let remaining = token_budget.saturating_sub(total_tokens(&system));

        let (mut selected, _) = newest_first_fill(&rest, remaining);

        let mut truncated = false;
        if selected.is_empty() && !rest.is_empty() && remaining > 0 {
            // budget smaller than any single message: keep a truncated tail
            if let Some(tail) = rest.last().and_then(|m| truncate_to_budget(m, remaining)) {
                selected.push(tail);
                truncated = true;
            }
        }

        debug!(
            window = selected.len(),
            system = system.len(),
            total = messages.len(),
            "Rolling window selection"
        );

        let mut out = system;
        out.extend(selected);
        Ok(OptimizedContext::from_selection(
            self.kind(),
            out,
            Vec::new(),
            messages,
            token_budget,
            truncated,
        ))
    }
}
