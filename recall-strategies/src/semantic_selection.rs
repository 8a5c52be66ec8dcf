//! Semantic selection strategy: keep the messages most relevant to the
//! current query.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use recall_core::{Message, OptimizedContext, StrategyKind};
use tracing::{debug, warn};

use crate::fill::{
    latest_user_query, passthrough_if_fits, split_system, total_tokens, truncate_to_budget,
};
use crate::relevance::RelevanceScorer;
use crate::strategy::OptimizationStrategy;

/// Ranks non-System messages by relevance to the query (the latest user
/// message when no query is given) and fills the budget by descending
/// relevance. System messages always come first.
///
/// Scoring goes through the [`RelevanceScorer`] extension point; a scoring
/// failure degrades to recency order instead of failing the assembly.
pub struct SemanticSelectionStrategy {
    scorer: Arc<dyn RelevanceScorer>,
}

impl SemanticSelectionStrategy {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }
}

#[async_trait]
impl OptimizationStrategy for SemanticSelectionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SemanticSelection
    }

    async fn optimize(
        &self,
        messages: &[Message],
        token_budget: usize,
        query: Option<&str>,
    ) -> Result<OptimizedContext, anyhow::Error> {
        if messages.is_empty() {
            return Ok(OptimizedContext::empty(self.kind()));
        }
        if let Some(ctx) = passthrough_if_fits(self.kind(), messages, token_budget) {
            return Ok(ctx);
        }

        let (system, rest) = split_system(messages);
        let remaining = token_budget.saturating_sub(total_tokens(&system));

        let query_text = query.or_else(|| latest_user_query(&rest)).unwrap_or("");
        let scores = match self.scorer.score_batch(query_text, &rest).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, "Relevance scoring failed, falling back to recency order");
                // newest gets the highest score
                (0..rest.len()).map(|i| i as f32).collect()
            }
        };

        let mut ranked: Vec<(usize, &Message, f32)> = rest
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m, scores.get(i).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|(_, a, sa), (_, b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });

        let mut picked: Vec<(usize, Message)> = Vec::new();
        let mut tokens = 0usize;
        for (index, message, _) in &ranked {
            let t = message.tokens();
            if tokens + t > remaining {
                continue;
            }
            picked.push((*index, (*message).clone()));
            tokens += t;
        }

        let mut truncated = false;
        if picked.is_empty() && !rest.is_empty() && remaining > 0 {
            if let Some((index, best, _)) = ranked.first() {
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
            query_len = query_text.len(),
            "Semantic selection"
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
