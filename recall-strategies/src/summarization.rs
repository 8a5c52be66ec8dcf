//! Summarization strategy: recent slice verbatim, older slice compressed
//! into one summary through the model client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use recall_core::{
    Message, MessageRole, ModelClient, OptimizedContext, StrategyKind, Summary,
};
use tracing::{debug, warn};

use crate::fill::{
    newest_first_fill, passthrough_if_fits, split_system, summary_message, total_tokens,
    truncate_to_budget,
};
use crate::strategy::OptimizationStrategy;

/// Fraction of the (post-System) budget reserved for the recent verbatim
/// slice.
const DEFAULT_RECENT_FRACTION: f64 = 0.6;

/// Default deadline for the model call producing the summary.
const DEFAULT_SUMMARY_DEADLINE: Duration = Duration::from_secs(10);

/// Partitions history into a recent slice (largest suffix fitting the
/// reserved fraction of the budget, kept verbatim) and an older slice
/// compressed into one [`Summary`] via the model client.
///
/// The model call runs under a deadline. Failure or timeout never fails
/// the assembly: the summary degrades to a one-line digest marking it
/// unavailable.
pub struct SummarizationStrategy {
    model: Arc<dyn ModelClient>,
    recent_fraction: f64,
    deadline: Duration,
}

impl SummarizationStrategy {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            recent_fraction: DEFAULT_RECENT_FRACTION,
            deadline: DEFAULT_SUMMARY_DEADLINE,
        }
    }

    /// Overrides the reserved fraction for the recent slice (clamped to
    /// (0, 1]).
    pub fn with_recent_fraction(mut self, fraction: f64) -> Self {
        self.recent_fraction = fraction.clamp(0.05, 1.0);
        self
    }

    /// Overrides the model-call deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Compresses `older` into a summary; degrades to a digest line when
    /// the model is unavailable.
    pub(crate) async fn summarize(&self, session_id: &str, older: &[Message]) -> Summary {
        let prompt = build_summary_prompt(older);
        match self.model.complete(&prompt, self.deadline).await {
            Ok(text) if !text.trim().is_empty() => {
                Summary::new(session_id, older, text.trim())
            }
            Ok(_) => {
                warn!(session_id, "Summary model returned empty output, marking unavailable");
                Summary::new(session_id, older, unavailable_digest(older))
            }
            Err(e) => {
                warn!(session_id, error = %e, "Summary model call failed, marking unavailable");
                Summary::new(session_id, older, unavailable_digest(older))
            }
        }
    }
}

/// Digest used when the model cannot produce a summary.
fn unavailable_digest(older: &[Message]) -> String {
    format!(
        "(summary unavailable) {} earlier messages were omitted",
        older.len()
    )
}

/// Prompt for the compression step.
fn build_summary_prompt(messages: &[Message]) -> String {
    let mut prompt = String::from(
        "Compress the following conversation into a short summary.\n\nConversation:\n",
    );
    for message in messages {
        let role = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        };
        prompt.push_str(role);
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nRequirements:\n\
         - Keep names, dates, decisions and unresolved questions.\n\
         - End with at most 5 key points, each on its own line starting with \"-\".\n\
         - Stay under 120 words.\n",
    );
    prompt
}

#[async_trait]
impl OptimizationStrategy for SummarizationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Summarization
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

        if rest.is_empty() {
            // only System content, and it did not fit the budget
            return Ok(OptimizedContext::from_selection(
                self.kind(),
                system,
                Vec::new(),
                messages,
                token_budget,
                false,
            ));
        }

        let recent_budget = (remaining as f64 * self.recent_fraction) as usize;
        let (recent, _) = newest_first_fill(&rest, recent_budget);
        let older = &rest[..rest.len() - recent.len()];

        let session_id = messages[0].session_id.clone();
        let mut out = system;
        let mut summaries = Vec::new();
        let mut truncated = false;

        if !older.is_empty() {
            let summary = self.summarize(&session_id, older).await;
            let rendered = summary_message(&summary);
            // a summary only earns its place when it is cheaper than the
            // slice it replaces
            if rendered.tokens() < total_tokens(older) {
                debug!(
                    summarized = older.len(),
                    summary_tokens = rendered.tokens(),
                    "Compressed older slice into summary"
                );
                out.push(rendered);
                summaries.push(summary);
            } else {
                debug!(
                    summarized = older.len(),
                    "Summary larger than the slice it replaces, dropping it"
                );
            }
        }

        if recent.is_empty() && summaries.is_empty() && remaining > 0 {
            if let Some(tail) = rest.last().and_then(|m| truncate_to_budget(m, remaining)) {
                out.push(tail);
                truncated = true;
            }
        } else {
            out.extend(recent);
        }

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
