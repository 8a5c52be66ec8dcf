//! Hybrid strategy: system floor, one summary of older low-relevance
//! messages, top semantic picks, then the most recent messages verbatim.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use recall_core::{Message, ModelClient, OptimizedContext, StrategyKind};
use tracing::{debug, warn};

use crate::fill::{
    latest_user_query, newest_first_fill, passthrough_if_fits, split_system, summary_message,
    total_tokens, truncate_to_budget,
};
use crate::relevance::RelevanceScorer;
use crate::strategy::OptimizationStrategy;
use crate::summarization::SummarizationStrategy;

/// Budget split between the three buckets, applied to what remains after
/// the System floor.
const RECENT_FRACTION: f64 = 0.5;
const SEMANTIC_FRACTION: f64 = 0.2;

/// Combines the other strategies' mechanisms in priority order:
///
/// 1. System messages (hard floor)
/// 2. one summary of the older, low-relevance messages
/// 3. top picks by relevance to the current query
/// 4. most recent messages verbatim
pub struct HybridStrategy {
    summarizer: SummarizationStrategy,
    scorer: Arc<dyn RelevanceScorer>,
}

impl HybridStrategy {
    pub fn new(model: Arc<dyn ModelClient>, scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self {
            summarizer: SummarizationStrategy::new(model),
            scorer,
        }
    }

    /// Overrides the deadline of the summary model call.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.summarizer = self.summarizer.with_deadline(deadline);
        self
    }
}

#[async_trait]
impl OptimizationStrategy for HybridStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
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

        // 1. recent bucket
        let recent_budget = (remaining as f64 * RECENT_FRACTION) as usize;
        let (recent, _) = newest_first_fill(&rest, recent_budget);
        let recent_ids: HashSet<_> = recent.iter().map(|m| m.id).collect();
        let older: Vec<Message> = rest
            .iter()
            .filter(|m| !recent_ids.contains(&m.id))
            .cloned()
            .collect();

        // 2. semantic bucket out of the older slice
        let query_text = query.or_else(|| latest_user_query(&rest)).unwrap_or("");
        let scores = match self.scorer.score_batch(query_text, &older).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, "Relevance scoring failed, skipping semantic bucket");
                vec![0.0; older.len()]
            }
        };
        let mut ranked: Vec<(usize, &Message, f32)> = older
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m, scores.get(i).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|(_, a, sa), (_, b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });

        let semantic_budget = (remaining as f64 * SEMANTIC_FRACTION) as usize;
        let mut semantic: Vec<(usize, Message)> = Vec::new();
        let mut semantic_tokens = 0usize;
        for (index, message, score) in &ranked {
            if *score <= 0.0 {
                break;
            }
            let t = message.tokens();
            if semantic_tokens + t > semantic_budget {
                continue;
            }
            semantic.push((*index, (*message).clone()));
            semantic_tokens += t;
        }
        semantic.sort_by_key(|(index, _)| *index);
        let semantic_ids: HashSet<_> = semantic.iter().map(|(_, m)| m.id).collect();

        // 3. summary bucket over what neither recent nor semantic kept
        let to_summarize: Vec<Message> = older
            .iter()
            .filter(|m| !semantic_ids.contains(&m.id))
            .cloned()
            .collect();

        let session_id = messages[0].session_id.clone();
        let mut out = system;
        let mut summaries = Vec::new();

        if !to_summarize.is_empty() {
            let summary_budget = remaining.saturating_sub(semantic_tokens
                + recent.iter().map(|m| m.tokens()).sum::<usize>());
            let summary = self.summarizer.summarize(&session_id, &to_summarize).await;
            let rendered = summary_message(&summary);
            if rendered.tokens() < total_tokens(&to_summarize)
                && rendered.tokens() <= summary_budget
            {
                out.push(rendered);
                summaries.push(summary);
            } else {
                debug!(
                    summarized = to_summarize.len(),
                    "Hybrid summary did not fit its budget, dropping it"
                );
            }
        }

        let semantic_count = semantic.len();
        out.extend(semantic.into_iter().map(|(_, m)| m));

        let mut truncated = false;
        let nothing_fit = recent.is_empty() && semantic_count == 0 && summaries.is_empty();
        if nothing_fit && !rest.is_empty() && remaining > 0 {
            // nothing from the history fit: keep a truncated tail
            if let Some(tail) = rest.last().and_then(|m| truncate_to_budget(m, remaining)) {
                out.push(tail);
                truncated = true;
            }
        } else {
            out.extend(recent);
        }

        debug!(
            output = out.len(),
            summaries = summaries.len(),
            total = messages.len(),
            "Hybrid selection"
        );

        Ok(OptimizedContext::from_selection(
            self.kind(),
            out,
            summaries,
            messages,
            token_budget,
            truncated,
        ))
    }
}
