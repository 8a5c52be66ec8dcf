//! Batch hygiene for extracted items.

use std::collections::HashMap;

use tracing::debug;

use recall_core::{MemoryItem, MemoryKind, ValidationError};

/// Drops structurally invalid items, items below the confidence threshold
/// and duplicate keys (highest confidence wins), clamping scores on the
/// way through. A bad item never aborts the rest of the batch; each drop
/// is logged.
pub fn validate_and_clean(items: Vec<MemoryItem>, confidence_threshold: f32) -> Vec<MemoryItem> {
    let mut by_key: HashMap<(Option<String>, MemoryKind, String), MemoryItem> = HashMap::new();
    let mut order: Vec<(Option<String>, MemoryKind, String)> = Vec::new();

    for mut item in items {
        if item.subject_id.trim().is_empty() {
            debug!(error = %ValidationError::EmptyField("subject_id"), "Dropping extracted item");
            continue;
        }
        if item.key.trim().is_empty() {
            debug!(error = %ValidationError::EmptyField("key"), "Dropping extracted item");
            continue;
        }
        if item.value.trim().is_empty() {
            debug!(key = %item.key, error = %ValidationError::EmptyField("value"), "Dropping extracted item");
            continue;
        }

        item.confidence = item.confidence.clamp(0.0, 1.0);
        item.importance = item.importance.clamp(0.0, 1.0);

        if item.confidence < confidence_threshold {
            debug!(
                key = %item.key,
                error = %ValidationError::BelowThreshold {
                    actual: item.confidence,
                    threshold: confidence_threshold,
                },
                "Dropping extracted item"
            );
            continue;
        }

        let key = (item.character_id.clone(), item.kind, item.key.clone());
        match by_key.get(&key) {
            Some(existing) if existing.confidence >= item.confidence => {
                debug!(
                    key = %item.key,
                    error = %ValidationError::DuplicateKey(item.key.clone()),
                    "Dropping extracted item"
                );
            }
            Some(_) => {
                debug!(
                    key = %item.key,
                    error = %ValidationError::DuplicateKey(item.key.clone()),
                    "Replacing lower-confidence duplicate"
                );
                by_key.insert(key, item);
            }
            None => {
                order.push(key.clone());
                by_key.insert(key, item);
            }
        }
    }

    order.into_iter().filter_map(|key| by_key.remove(&key)).collect()
}
