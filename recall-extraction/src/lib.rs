//! # Memory Extraction
//!
//! Extracts durable long-term memories (facts, preferences, episodic and
//! character-scoped memories) from raw conversation.
//!
//! The pipeline is a plain two-step composite: a primary model-backed
//! extractor is tried first; on failure, timeout or empty output the
//! deterministic rule-based extractor answers instead, independently per
//! category. The rule-based extractor is pure local computation and never
//! fails, so it is always available as the terminal fallback.
//!
//! ## Modules
//!
//! - [`extractor`] - `MemoryExtractor` trait
//! - [`rule_based`] - regex/keyword fallback extractor
//! - [`model_backed`] - model-backed primary extractor (JSON prompts)
//! - [`pipeline`] - `ExtractionPipeline` (primary + fallback + validation)
//! - [`validate`] - `validate_and_clean` batch hygiene
//! - [`worker`] - bounded async dispatch with per-subject serialization

mod extractor;
mod model_backed;
mod pipeline;
mod rule_based;
mod validate;
mod worker;

pub use extractor::MemoryExtractor;
pub use model_backed::ModelExtractor;
pub use pipeline::ExtractionPipeline;
pub use rule_based::RuleBasedExtractor;
pub use validate::validate_and_clean;
pub use worker::{ExtractionRequest, ExtractionWorker};
