//! # Long-Term Memory Types
//!
//! Durable, cross-session memory records extracted from conversation:
//! [`MemoryItem`] (facts, preferences, episodic memories) and
//! [`RelationshipMemory`] with its bounded interaction history.
//!
//! The upsert identity of a memory item is the composite key
//! `(subject_id, character_id?, kind, key)`: a later extraction for the same
//! key updates value and confidence instead of duplicating the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a long-term memory item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MemoryKind {
    /// A stable fact about the subject ("name", "location", ...)
    Fact,
    /// A like/dislike or configuration preference
    Preference,
    /// A remembered moment or event
    Episodic,
}

/// Where an extracted item came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MemorySource {
    /// Primary model-backed extractor
    Model,
    /// Deterministic rule-based extractor
    Rule,
    /// Manually entered by a caller
    Manual,
}

/// A single durable memory record scoped to a subject and optionally to a
/// character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryItem {
    /// Row identifier
    pub id: Uuid,
    /// Category of the item
    pub kind: MemoryKind,
    /// The user this memory belongs to
    pub subject_id: String,
    /// Scopes character-bound memories; `None` for subject-global items
    pub character_id: Option<String>,
    /// Upsert key within the (subject, character, kind) scope
    pub key: String,
    /// The remembered content
    pub value: String,
    /// Extraction confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Importance score (0.0 to 1.0)
    pub importance: f32,
    /// Where the item came from
    pub source: MemorySource,
    /// Free-form tags
    pub tags: Vec<String>,
    /// When the item was first stored
    pub created_at: DateTime<Utc>,
    /// Last upsert time
    pub updated_at: DateTime<Utc>,
    /// Number of merges into this row
    pub access_count: u32,
}

impl MemoryItem {
    /// Creates a new item with defaults: confidence 0.7, importance 0.5,
    /// no character scope.
    pub fn new(
        kind: MemoryKind,
        subject_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        source: MemorySource,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            subject_id: subject_id.into(),
            character_id: None,
            key: key.into(),
            value: value.into(),
            confidence: 0.7,
            importance: 0.5,
            source,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            access_count: 0,
        }
    }

    /// Returns a copy scoped to a character.
    pub fn with_character(mut self, character_id: impl Into<String>) -> Self {
        self.character_id = Some(character_id.into());
        self
    }

    /// Returns a copy with the given confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Returns a copy with the given importance, clamped to [0, 1].
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    /// Returns a copy with the given tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// True if `other` addresses the same upsert key.
    pub fn same_key(&self, other: &MemoryItem) -> bool {
        self.subject_id == other.subject_id
            && self.character_id == other.character_id
            && self.kind == other.kind
            && self.key == other.key
    }
}

/// Filter for long-term memory queries. Empty filter matches everything
/// for the subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryFilter {
    pub kind: Option<MemoryKind>,
    pub character_id: Option<String>,
    pub min_confidence: Option<f32>,
    pub min_importance: Option<f32>,
}

impl MemoryFilter {
    /// True if `item` passes every set field of the filter.
    pub fn matches(&self, item: &MemoryItem) -> bool {
        if let Some(kind) = self.kind {
            if item.kind != kind {
                return false;
            }
        }
        if let Some(character_id) = &self.character_id {
            if item.character_id.as_deref() != Some(character_id.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.min_confidence {
            if item.confidence < min {
                return false;
            }
        }
        if let Some(min) = self.min_importance {
            if item.importance < min {
                return false;
            }
        }
        true
    }
}

/// Pagination window for memory queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

/// Closeness band of a relationship, inferred from its strength.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    Stranger,
    Acquaintance,
    Friend,
    Close,
    Companion,
}

/// One observed interaction between a subject and a related party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Short description of what happened
    pub summary: String,
    /// Sentiment of the interaction, -1.0 (hostile) to 1.0 (warm)
    pub sentiment: f32,
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    pub fn new(summary: impl Into<String>, sentiment: f32) -> Self {
        Self {
            summary: summary.into(),
            sentiment: sentiment.clamp(-1.0, 1.0),
            timestamp: Utc::now(),
        }
    }
}

/// Audit entry recorded whenever new evidence changes a relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipChange {
    pub old_type: RelationshipType,
    pub new_type: RelationshipType,
    pub old_strength: f32,
    pub new_strength: f32,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Maximum interactions retained per relationship.
pub const MAX_INTERACTION_HISTORY: usize = 50;

/// Smoothing factor for strength updates: new evidence contributes 30%.
const STRENGTH_ALPHA: f32 = 0.3;

/// Durable record of the relationship between a subject and a related
/// party (another user or a character), mutated whenever new interaction
/// evidence is extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipMemory {
    pub subject_id: String,
    pub related_id: String,
    pub relationship_type: RelationshipType,
    /// Closeness (0.0 to 1.0)
    pub strength: f32,
    /// Most recent interactions, bounded by [`MAX_INTERACTION_HISTORY`]
    pub interactions: Vec<Interaction>,
    /// Type/strength transitions with reasons
    pub changes: Vec<RelationshipChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RelationshipMemory {
    /// New relationship starting as a stranger with minimal strength.
    pub fn new(subject_id: impl Into<String>, related_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            subject_id: subject_id.into(),
            related_id: related_id.into(),
            relationship_type: RelationshipType::Stranger,
            strength: 0.1,
            interactions: Vec::new(),
            changes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Closeness band for a strength value.
    pub fn type_for_strength(strength: f32) -> RelationshipType {
        match strength {
            s if s >= 0.85 => RelationshipType::Companion,
            s if s >= 0.65 => RelationshipType::Close,
            s if s >= 0.4 => RelationshipType::Friend,
            s if s >= 0.2 => RelationshipType::Acquaintance,
            _ => RelationshipType::Stranger,
        }
    }

    /// Applies one interaction: appends to the bounded history, moves the
    /// strength toward the interaction's sentiment (mapped into [0, 1]) by
    /// exponential smoothing, and records a change entry when the
    /// inferred type or the strength moved.
    ///
    /// Store implementations call this so that every backend shares the
    /// same merge semantics.
    pub fn apply_interaction(&mut self, interaction: Interaction, reason: &str) {
        let old_type = self.relationship_type;
        let old_strength = self.strength;

        let evidence = (interaction.sentiment + 1.0) / 2.0;
        self.strength = (old_strength * (1.0 - STRENGTH_ALPHA) + evidence * STRENGTH_ALPHA)
            .clamp(0.0, 1.0);
        self.relationship_type = Self::type_for_strength(self.strength);

        self.interactions.push(interaction);
        if self.interactions.len() > MAX_INTERACTION_HISTORY {
            let excess = self.interactions.len() - MAX_INTERACTION_HISTORY;
            self.interactions.drain(0..excess);
        }

        if self.relationship_type != old_type || (self.strength - old_strength).abs() > f32::EPSILON {
            self.changes.push(RelationshipChange {
                old_type,
                new_type: self.relationship_type,
                old_strength,
                new_strength: self.strength,
                reason: reason.to_string(),
                timestamp: Utc::now(),
            });
        }
        self.updated_at = Utc::now();
    }
}
