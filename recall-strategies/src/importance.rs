//! Importance-based strategy: keep the highest-importance messages.

use std::cmp::Ordering;

use async_trait::async_trait;
use recall_core::{Message, OptimizedContext, StrategyKind};
use tracing::debug;

use crate::fill::{passthrough_if_fits, split_system, total_tokens, truncate_to_budget};
use crate::strategy::OptimizationStrategy;

/// Ranks messages by importance (recency breaks ties) and fills the budget
/// greedily, then restores chronological order.
#[derive(Debug, Clone, Default)]
pub struct ImportanceBasedStrategy;

impl ImportanceBasedStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OptimizationStrategy for ImportanceBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ImportanceBased
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

        let mut ranked: Vec<(usize, &Message)> = rest.iter().enumerate().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });

        let mut picked: Vec<(usize, Message)> = Vec::new();
        let mut tokens = 0usize;
        for (index, message) in &ranked {
            let t = message.tokens();
            if tokens + t > remaining {
                continue;
            }
            picked.push((*index, (*message).clone()));
            tokens += t;
        }

        let mut truncated = false;
        if picked.is_empty() && !rest.is_empty() && remaining > 0 {
            // nothing fits whole: keep the top-ranked message, truncated
            if let Some((index, best)) = ranked.first() {
                if let Some(cut) = truncate_to_budget(best, remaining) {
                    picked.push((*index, cut));
                    truncated = true;
                }
            }
        }

        picked.sort_by_key(|(index, _)| *index);
        let selected: Vec<Message> = picked.into_iter().map(|(_, m)| m).collect();

        debug!(
            picked = selected.len(),
            system = system.len(),
            total = messages.len(),
            "Importance-based selection"
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
