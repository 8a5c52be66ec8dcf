//! Shared budget-fill helpers used by the strategy implementations.

use recall_core::{
    Message, MessageRole, OptimizedContext, StrategyKind, Summary, CHARS_PER_TOKEN,
};

/// Sum of resolved token counts.
pub(crate) fn total_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.tokens()).sum()
}

/// Splits the history into (system, everything else), both in original order.
pub(crate) fn split_system(messages: &[Message]) -> (Vec<Message>, Vec<Message>) {
    let (system, rest): (Vec<Message>, Vec<Message>) = messages
        .iter()
        .cloned()
        .partition(|m| m.role == MessageRole::System);
    (system, rest)
}

/// Identity shortcut: a history that already fits the budget is returned
/// unmodified.
pub(crate) fn passthrough_if_fits(
    kind: StrategyKind,
    messages: &[Message],
    token_budget: usize,
) -> Option<OptimizedContext> {
    if total_tokens(messages) <= token_budget {
        Some(OptimizedContext::from_selection(
            kind,
            messages.to_vec(),
            Vec::new(),
            messages,
            token_budget,
            false,
        ))
    } else {
        None
    }
}

/// Fills newest-first until the next message would overflow `budget`;
/// returns the selection in chronological order plus its token sum.
/// No partial messages.
pub(crate) fn newest_first_fill(candidates: &[Message], budget: usize) -> (Vec<Message>, usize) {
    let mut selected = Vec::new();
    let mut tokens = 0usize;
    for message in candidates.iter().rev() {
        let t = message.tokens();
        if tokens + t > budget {
            break;
        }
        selected.push(message.clone());
        tokens += t;
    }
    selected.reverse();
    (selected, tokens)
}

/// Copy of `message` with its content cut down to roughly `budget` tokens.
/// Returns `None` for a zero budget (nothing can be included at all).
pub(crate) fn truncate_to_budget(message: &Message, budget: usize) -> Option<Message> {
    if budget == 0 {
        return None;
    }
    let max_chars = budget.saturating_mul(CHARS_PER_TOKEN);
    let mut truncated = message.clone();
    truncated.content = message.content.chars().take(max_chars).collect();
    truncated.token_estimate = None;
    truncated
        .metadata
        .insert("truncated".to_string(), "true".to_string());
    Some(truncated)
}

/// Renders a summary as a System message so it can ride along in the
/// assembled context.
pub(crate) fn summary_message(summary: &Summary) -> Message {
    Message::new(
        summary.session_id.clone(),
        MessageRole::System,
        format!("[Conversation summary]\n{}", summary.text),
    )
    .with_timestamp(summary.end)
    .with_metadata("summary", "true")
}

/// Content of the latest user message, used as the relevance query when
/// the caller did not provide one.
pub(crate) fn latest_user_query(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
}
