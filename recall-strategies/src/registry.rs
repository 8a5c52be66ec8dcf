//! Strategy registry keyed by strategy kind and session type.

use std::collections::HashMap;
use std::sync::Arc;

use recall_core::{ModelClient, SessionType, StrategyKind};

use crate::hybrid::HybridStrategy;
use crate::importance::ImportanceBasedStrategy;
use crate::relevance::{KeywordOverlapScorer, RelevanceScorer};
use crate::rolling_window::RollingWindowStrategy;
use crate::semantic_selection::SemanticSelectionStrategy;
use crate::strategy::OptimizationStrategy;
use crate::summarization::SummarizationStrategy;

/// Holds one instance per strategy kind and resolves the default strategy
/// for a session type (Chat→Hybrid, Task→ImportanceBased,
/// Workflow→Summarization, Collaborative→RollingWindow).
pub struct StrategyRegistry {
    strategies: HashMap<StrategyKind, Arc<dyn OptimizationStrategy>>,
}

impl StrategyRegistry {
    /// Empty registry; register strategies explicitly.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registry with all five strategies wired to the given collaborators,
    /// using the keyword-overlap relevance scorer.
    pub fn with_defaults(model: Arc<dyn ModelClient>) -> Self {
        Self::with_scorer(model, Arc::new(KeywordOverlapScorer::new()))
    }

    /// Registry with all five strategies and a custom relevance scorer.
    pub fn with_scorer(model: Arc<dyn ModelClient>, scorer: Arc<dyn RelevanceScorer>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RollingWindowStrategy::new()));
        registry.register(Arc::new(ImportanceBasedStrategy::new()));
        registry.register(Arc::new(SummarizationStrategy::new(model.clone())));
        registry.register(Arc::new(SemanticSelectionStrategy::new(scorer.clone())));
        registry.register(Arc::new(HybridStrategy::new(model, scorer)));
        registry
    }

    /// Registers (or replaces) the strategy for its own kind.
    pub fn register(&mut self, strategy: Arc<dyn OptimizationStrategy>) {
        self.strategies.insert(strategy.kind(), strategy);
    }

    /// Strategy for an explicitly requested kind.
    pub fn get(&self, kind: StrategyKind) -> Option<Arc<dyn OptimizationStrategy>> {
        self.strategies.get(&kind).cloned()
    }

    /// Default strategy for a session type.
    pub fn for_session_type(&self, session_type: SessionType) -> Option<Arc<dyn OptimizationStrategy>> {
        self.get(StrategyKind::for_session_type(session_type))
    }

    /// Registered kinds.
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.keys().copied().collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
