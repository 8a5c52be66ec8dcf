//! # Context Strategies
//!
//! This crate provides the strategies that turn a session's raw history
//! into a token-budgeted [`recall_core::OptimizedContext`].
//!
//! Available strategies:
//! - `RollingWindowStrategy`: most recent messages, newest-first fill
//! - `SummarizationStrategy`: recent slice verbatim, older slice compressed
//!   into one summary via the model client
//! - `SemanticSelectionStrategy`: most relevant messages for the current
//!   query, scored through the [`RelevanceScorer`] extension point
//! - `ImportanceBasedStrategy`: highest-importance messages first
//! - `HybridStrategy`: system floor, summary, semantic picks, recent
//!   verbatim, in that priority order
//!
//! Shared rules (every strategy):
//! - System messages are a hard inclusion floor; if they alone exceed the
//!   budget the result is returned with `over_budget` set
//! - empty history produces an empty all-zero result
//! - a history that already fits the budget is returned unmodified
//! - a non-zero budget smaller than any single candidate yields one
//!   truncated message with the `truncated` flag set
//!
//! ## Logging
//!
//! Strategies emit `tracing` debug logs so context behavior can be
//! inspected in production: selection sizes, summary fallbacks, budget
//! overruns.

mod fill;
mod hybrid;
mod importance;
mod registry;
mod relevance;
mod rolling_window;
mod semantic_selection;
mod strategy;
mod summarization;

pub use hybrid::HybridStrategy;
pub use importance::ImportanceBasedStrategy;
pub use registry::StrategyRegistry;
pub use relevance::{KeywordOverlapScorer, RelevanceScorer};
pub use rolling_window::RollingWindowStrategy;
pub use semantic_selection::SemanticSelectionStrategy;
pub use strategy::OptimizationStrategy;
pub use summarization::SummarizationStrategy;
