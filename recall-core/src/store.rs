//! # Store Interfaces
//!
//! Storage traits implemented by backends (in-memory, SQLite, or an
//! external TTL-capable key/value store).
//!
//! [`ShortTermStore`] is the bounded, TTL-backed per-session message log;
//! [`LongTermMemoryStore`] is the durable, scoped memory store written by
//! the extraction pipeline and read by the assembler and by callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::memory::{Interaction, MemoryFilter, MemoryItem, Page, RelationshipMemory};
use crate::types::Message;

/// Selects which part of a session's history to read.
#[derive(Debug, Clone, Copy)]
pub enum ReadSelector {
    /// Everything, in insertion order
    All,
    /// The most recent `n` messages, in insertion order
    LastN(usize),
    /// Messages with `since <= timestamp <= until`
    TimeRange {
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    },
}

/// Bounded, TTL-backed per-session message log with compaction.
///
/// Implementations shard state by session id: appends within one session
/// are serialized, sessions never contend with each other, and reads may
/// race an in-flight append (either state is acceptable).
///
/// After an append returns, the session's size never exceeds the
/// configured cap: crossing the cap trims the log down to the configured
/// retention fraction of the cap, discarding the oldest prefix. Appends
/// refresh the session TTL; an expired session behaves as absent.
#[async_trait]
pub trait ShortTermStore: Send + Sync {
    /// Appends `messages` in order and refreshes the session TTL.
    ///
    /// A failed append must not corrupt previously stored messages.
    async fn append(&self, session_id: &str, messages: Vec<Message>) -> Result<(), StorageError>;

    /// Reads messages in insertion order. Unknown or expired sessions
    /// return an empty list, not an error.
    async fn read(&self, session_id: &str, selector: ReadSelector) -> Result<Vec<Message>, StorageError>;

    /// Number of currently stored messages for the session.
    async fn len(&self, session_id: &str) -> Result<usize, StorageError>;

    /// Removes all messages but keeps the session entry.
    async fn clear(&self, session_id: &str) -> Result<(), StorageError>;

    /// Removes the session entry entirely.
    async fn delete(&self, session_id: &str) -> Result<(), StorageError>;

    /// Ids of all live (non-expired) sessions.
    async fn session_ids(&self) -> Result<Vec<String>, StorageError>;
}

/// Durable, scoped long-term memory store.
#[async_trait]
pub trait LongTermMemoryStore: Send + Sync {
    /// Inserts `item`, or merges it into the existing row with the same
    /// `(subject_id, character_id?, kind, key)`: value, confidence,
    /// importance, source and tags are replaced, `updated_at` refreshed
    /// and `access_count` incremented. Returns the stored row.
    async fn upsert(&self, item: MemoryItem) -> Result<MemoryItem, StorageError>;

    /// Filtered, paginated query for a subject, most recently updated
    /// first.
    async fn query(
        &self,
        subject_id: &str,
        filter: MemoryFilter,
        page: Page,
    ) -> Result<Vec<MemoryItem>, StorageError>;

    /// Appends an interaction to the relationship between `subject_id` and
    /// `related_id` (creating it if absent), updating strength/type and
    /// the change history. Returns the updated relationship.
    async fn record_interaction(
        &self,
        subject_id: &str,
        related_id: &str,
        interaction: Interaction,
    ) -> Result<RelationshipMemory, StorageError>;

    /// Fetches a relationship record, `None` if it was never observed.
    async fn get_relationship(
        &self,
        subject_id: &str,
        related_id: &str,
    ) -> Result<Option<RelationshipMemory>, StorageError>;

    /// Removes every memory item and relationship for a subject; returns
    /// how many records were deleted.
    async fn delete_for_subject(&self, subject_id: &str) -> Result<u64, StorageError>;
}
