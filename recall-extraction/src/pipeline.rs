//! Composite extraction pipeline: primary, then fallback, then hygiene.
//!
//! A plain two-step function per category, not a hierarchy. The primary
//! extractor's failures (errors, timeouts, empty output) are logged and
//! swallowed; only a fallback failure surfaces, as
//! [`recall_core::ExtractionError`].

use std::sync::Arc;

use tracing::{debug, warn};

use recall_core::{ExtractionError, MemoryItem, Message};

use crate::extractor::MemoryExtractor;
use crate::validate::validate_and_clean;

/// Default minimum confidence for stored items.
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Primary-with-fallback extraction, independently per category.
pub struct ExtractionPipeline {
    primary: Option<Arc<dyn MemoryExtractor>>,
    fallback: Arc<dyn MemoryExtractor>,
    confidence_threshold: f32,
}

impl ExtractionPipeline {
    /// `primary` is typically a [`crate::ModelExtractor`]; pass `None` to
    /// run rule-based extraction only. `fallback` must never fail under
    /// normal operation (the rule-based extractor qualifies).
    pub fn new(primary: Option<Arc<dyn MemoryExtractor>>, fallback: Arc<dyn MemoryExtractor>) -> Self {
        Self {
            primary,
            fallback,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Overrides the minimum confidence kept by validation.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub async fn extract_facts(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, ExtractionError> {
        if let Some(primary) = &self.primary {
            match primary.extract_facts(subject_id, messages).await {
                Ok(items) if !items.is_empty() => {
                    debug!(subject_id, count = items.len(), "Primary extractor produced facts");
                    return Ok(validate_and_clean(items, self.confidence_threshold));
                }
                Ok(_) => debug!(subject_id, "Primary extractor found no facts, using fallback"),
                Err(e) => warn!(subject_id, error = %e, "Primary fact extraction failed, using fallback"),
            }
        }
        let items = self
            .fallback
            .extract_facts(subject_id, messages)
            .await
            .map_err(|e| ExtractionError::FallbackFailed {
                category: "facts".to_string(),
                message: e.to_string(),
            })?;
        Ok(validate_and_clean(items, self.confidence_threshold))
    }

    pub async fn extract_preferences(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, ExtractionError> {
        if let Some(primary) = &self.primary {
            match primary.extract_preferences(subject_id, messages).await {
                Ok(items) if !items.is_empty() => {
                    debug!(subject_id, count = items.len(), "Primary extractor produced preferences");
                    return Ok(validate_and_clean(items, self.confidence_threshold));
                }
                Ok(_) => debug!(subject_id, "Primary extractor found no preferences, using fallback"),
                Err(e) => {
                    warn!(subject_id, error = %e, "Primary preference extraction failed, using fallback")
                }
            }
        }
        let items = self
            .fallback
            .extract_preferences(subject_id, messages)
            .await
            .map_err(|e| ExtractionError::FallbackFailed {
                category: "preferences".to_string(),
                message: e.to_string(),
            })?;
        Ok(validate_and_clean(items, self.confidence_threshold))
    }

    pub async fn extract_episodic(
        &self,
        subject_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, ExtractionError> {
        if let Some(primary) = &self.primary {
            match primary.extract_episodic(subject_id, messages).await {
                Ok(items) if !items.is_empty() => {
                    debug!(subject_id, count = items.len(), "Primary extractor produced episodic memories");
                    return Ok(validate_and_clean(items, self.confidence_threshold));
                }
                Ok(_) => debug!(subject_id, "Primary extractor found no episodic memories, using fallback"),
                Err(e) => {
                    warn!(subject_id, error = %e, "Primary episodic extraction failed, using fallback")
                }
            }
        }
        let items = self
            .fallback
            .extract_episodic(subject_id, messages)
            .await
            .map_err(|e| ExtractionError::FallbackFailed {
                category: "episodic".to_string(),
                message: e.to_string(),
            })?;
        Ok(validate_and_clean(items, self.confidence_threshold))
    }

    pub async fn extract_character_memories(
        &self,
        subject_id: &str,
        character_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, ExtractionError> {
        if let Some(primary) = &self.primary {
            match primary
                .extract_character_memories(subject_id, character_id, messages)
                .await
            {
                Ok(items) if !items.is_empty() => {
                    debug!(
                        subject_id,
                        character_id,
                        count = items.len(),
                        "Primary extractor produced character memories"
                    );
                    return Ok(validate_and_clean(items, self.confidence_threshold));
                }
                Ok(_) => debug!(subject_id, character_id, "Primary extractor found no character memories"),
                Err(e) => warn!(
                    subject_id,
                    character_id,
                    error = %e,
                    "Primary character extraction failed, using fallback"
                ),
            }
        }
        let items = self
            .fallback
            .extract_character_memories(subject_id, character_id, messages)
            .await
            .map_err(|e| ExtractionError::FallbackFailed {
                category: "character".to_string(),
                message: e.to_string(),
            })?;
        Ok(validate_and_clean(items, self.confidence_threshold))
    }

    pub async fn extract_scene_memories(
        &self,
        character_id: &str,
        scene_id: &str,
        messages: &[Message],
    ) -> Result<Vec<MemoryItem>, ExtractionError> {
        if let Some(primary) = &self.primary {
            match primary
                .extract_scene_memories(character_id, scene_id, messages)
                .await
            {
                Ok(items) if !items.is_empty() => {
                    debug!(
                        character_id,
                        scene_id,
                        count = items.len(),
                        "Primary extractor produced scene memories"
                    );
                    return Ok(validate_and_clean(items, self.confidence_threshold));
                }
                Ok(_) => debug!(character_id, scene_id, "Primary extractor found no scene memories"),
                Err(e) => warn!(
                    character_id,
                    scene_id,
                    error = %e,
                    "Primary scene extraction failed, using fallback"
                ),
            }
        }
        let items = self
            .fallback
            .extract_scene_memories(character_id, scene_id, messages)
            .await
            .map_err(|e| ExtractionError::FallbackFailed {
                category: "scene".to_string(),
                message: e.to_string(),
            })?;
        Ok(validate_and_clean(items, self.confidence_threshold))
    }
}
