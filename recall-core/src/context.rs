//! # Optimized Context
//!
//! Result types produced by context optimization strategies and consumed by
//! callers before a model call: [`StrategyKind`], [`Summary`] and
//! [`OptimizedContext`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tokens::estimate_tokens;
use crate::types::{Message, SessionType};

/// The named context optimization strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    RollingWindow,
    Summarization,
    SemanticSelection,
    ImportanceBased,
    Hybrid,
}

impl StrategyKind {
    /// Default strategy for a session type.
    ///
    /// Chat sessions get the hybrid strategy, task sessions rank by
    /// importance, workflows summarize, collaborative sessions keep a
    /// rolling window.
    pub fn for_session_type(session_type: SessionType) -> Self {
        match session_type {
            SessionType::Chat => StrategyKind::Hybrid,
            SessionType::Task => StrategyKind::ImportanceBased,
            SessionType::Workflow => StrategyKind::Summarization,
            SessionType::Collaborative => StrategyKind::RollingWindow,
        }
    }

    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::RollingWindow => "rolling_window",
            StrategyKind::Summarization => "summarization",
            StrategyKind::SemanticSelection => "semantic_selection",
            StrategyKind::ImportanceBased => "importance_based",
            StrategyKind::Hybrid => "hybrid",
        }
    }
}

/// Compressed digest of a slice of conversation history.
///
/// Produced by the summarization and hybrid strategies. Ephemeral: carried
/// inside an [`OptimizedContext`] and not persisted unless the caller
/// chooses to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    /// Session the summarized messages belong to
    pub session_id: String,
    /// Timestamp of the earliest summarized message
    pub start: DateTime<Utc>,
    /// Timestamp of the latest summarized message
    pub end: DateTime<Utc>,
    /// How many messages were compressed into this summary
    pub original_message_count: usize,
    /// Token count of the compressed messages
    pub original_token_count: usize,
    /// Token count of the summary text itself
    pub summary_token_count: usize,
    /// The summary text
    pub text: String,
    /// Key points parsed out of the summary text (bullet lines)
    pub key_points: Vec<String>,
}

impl Summary {
    /// Builds a summary over `messages` (must be non-empty) with the given text.
    pub fn new(session_id: impl Into<String>, messages: &[Message], text: impl Into<String>) -> Self {
        let text = text.into();
        let key_points = extract_key_points(&text);
        Self {
            session_id: session_id.into(),
            start: messages.first().map(|m| m.timestamp).unwrap_or_else(Utc::now),
            end: messages.last().map(|m| m.timestamp).unwrap_or_else(Utc::now),
            original_message_count: messages.len(),
            original_token_count: messages.iter().map(|m| m.tokens()).sum(),
            summary_token_count: estimate_tokens(&text),
            text,
            key_points,
        }
    }
}

/// Parses bullet lines ("- ..." or "• ...") out of a summary text, keeping
/// at most five.
fn extract_key_points(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-') || line.starts_with('•'))
        .map(|line| line[1..].trim().to_string())
        .filter(|p| !p.is_empty())
        .take(5)
        .collect()
}

/// A token-budgeted context assembled from a session's history.
///
/// `messages` is what the caller sends to the model (summaries are already
/// rendered into it as System messages); the remaining fields are
/// diagnostics about what the optimization did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedContext {
    /// Messages to send, in order
    pub messages: Vec<Message>,
    /// Summaries used while assembling (also rendered into `messages`)
    pub summaries: Vec<Summary>,
    /// Strategy that produced this context
    pub strategy: StrategyKind,
    /// Message count of the full history
    pub original_message_count: usize,
    /// Message count of the assembled context (including summary messages)
    pub optimized_message_count: usize,
    /// Token count of the full history
    pub original_token_count: usize,
    /// Token count of the assembled context; never exceeds the original
    pub optimized_token_count: usize,
    /// Original messages not carried verbatim (summarized or dropped)
    pub dropped_message_count: usize,
    /// Set when mandatory content (System messages) alone exceeds the budget
    pub over_budget: bool,
    /// Set when a message had to be truncated to fit the budget
    pub truncated: bool,
}

impl OptimizedContext {
    /// Empty context with all counts zero; returned for empty histories.
    pub fn empty(strategy: StrategyKind) -> Self {
        Self {
            messages: Vec::new(),
            summaries: Vec::new(),
            strategy,
            original_message_count: 0,
            optimized_message_count: 0,
            original_token_count: 0,
            optimized_token_count: 0,
            dropped_message_count: 0,
            over_budget: false,
            truncated: false,
        }
    }

    /// Builds a context result from a selection over `original` history.
    ///
    /// Derives all counts; `dropped_message_count` counts original messages
    /// not carried verbatim (a rendered summary message does not reduce it).
    /// The optimized token count is capped at the original token count so
    /// the compression ratio never drops below 1.
    pub fn from_selection(
        strategy: StrategyKind,
        messages: Vec<Message>,
        summaries: Vec<Summary>,
        original: &[Message],
        token_budget: usize,
        truncated: bool,
    ) -> Self {
        let original_token_count: usize = original.iter().map(|m| m.tokens()).sum();
        let original_ids: HashSet<_> = original.iter().map(|m| m.id).collect();
        let kept_originals = messages.iter().filter(|m| original_ids.contains(&m.id)).count();
        let optimized_token_count: usize = messages.iter().map(|m| m.tokens()).sum();
        let optimized_token_count = optimized_token_count.min(original_token_count);
        Self {
            strategy,
            original_message_count: original.len(),
            optimized_message_count: messages.len(),
            original_token_count,
            optimized_token_count,
            dropped_message_count: original.len() - kept_originals,
            over_budget: optimized_token_count > token_budget,
            truncated,
            messages,
            summaries,
        }
    }

    /// Compression ratio: original tokens over optimized tokens (≥ 1 for
    /// lossy results, 1.0 for empty or untouched histories).
    pub fn compression_ratio(&self) -> f64 {
        self.original_token_count.max(1) as f64 / self.optimized_token_count.max(1) as f64
    }

    /// Returns true if no messages were assembled.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
