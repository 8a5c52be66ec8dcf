//! Engine configuration: defaults plus env-var loading.

use std::env;
use std::time::Duration;

/// Tunables for the engine. Every field has a default; `from_env` overrides
/// from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Token budget used when neither the caller nor the session supplies one
    pub default_token_budget: usize,
    /// Concurrent extraction tasks
    pub extraction_workers: usize,
    /// Minimum confidence kept by extraction validation
    pub confidence_threshold: f32,
    /// Deadline for model calls (summary and primary extraction)
    pub model_deadline: Duration,
    /// Whether the model-backed primary extractor runs at all; rule-based
    /// extraction always remains available
    pub enable_model_extraction: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_token_budget: 8000,
            extraction_workers: 4,
            confidence_threshold: 0.6,
            model_deadline: Duration::from_secs(10),
            enable_model_extraction: true,
        }
    }
}

impl EngineConfig {
    /// Loads overrides from environment variables:
    /// `RECALL_TOKEN_BUDGET`, `RECALL_EXTRACTION_WORKERS`,
    /// `RECALL_CONFIDENCE_THRESHOLD`, `RECALL_MODEL_DEADLINE_SECS`,
    /// `RECALL_ENABLE_MODEL_EXTRACTION`. Unset or unparsable variables
    /// keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_token_budget: env::var("RECALL_TOKEN_BUDGET")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_token_budget),
            extraction_workers: env::var("RECALL_EXTRACTION_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.extraction_workers),
            confidence_threshold: env::var("RECALL_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.confidence_threshold),
            model_deadline: env::var("RECALL_MODEL_DEADLINE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.model_deadline),
            enable_model_extraction: env::var("RECALL_ENABLE_MODEL_EXTRACTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.enable_model_extraction),
        }
    }
}
