//! Error taxonomy for the engine.
//!
//! Used by store backends, the extraction pipeline and the facade. Budget
//! overruns are deliberately NOT an error: an over-budget assembly is
//! returned with the `over_budget` flag set on the result.

use thiserror::Error;

/// Backing-store connectivity or serialization failure.
///
/// A failing operation never leaves the store partially written for that
/// call; previously stored data is unaffected.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Raised only when both the primary and the fallback extractor fail for a
/// category. A primary failure alone triggers a silent fallback and is
/// never surfaced to the caller.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("{category} extraction failed in primary and fallback: {message}")]
    FallbackFailed { category: String, message: String },
}

/// A malformed, duplicate or low-confidence extracted item. Dropped with a
/// log entry while the rest of the batch continues; never propagated.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("empty {0}")]
    EmptyField(&'static str),

    #[error("confidence {actual} below threshold {threshold}")]
    BelowThreshold { actual: f32, threshold: f32 },

    #[error("duplicate key {0}")]
    DuplicateKey(String),
}
