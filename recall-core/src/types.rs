//! # Core Types
//!
//! Message and session value types for the engine.
//!
//! ## MessageRole
//!
//! Represents the role of a message in a conversation.
//!
//! - `User`: Message sent by the user
//! - `Assistant`: Message sent by the AI assistant
//! - `System`: System-level message (instructions, injected summaries)
//!
//! ## Message
//!
//! A single immutable conversation message. Once appended to a
//! [`crate::store::ShortTermStore`] a message is never mutated; builders
//! produce updated copies before the append.
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `id` | `Uuid` | Unique identifier |
//! | `session_id` | `String` | Session the message belongs to |
//! | `role` | `MessageRole` | Role of the sender |
//! | `content` | `String` | The actual message text |
//! | `timestamp` | `DateTime<Utc>` | Non-decreasing per session |
//! | `token_estimate` | `Option<u32>` | Provider-supplied exact count |
//! | `importance` | `f32` | Importance score (0.0 to 1.0, System fixed at 1.0) |
//! | `metadata` | `HashMap<String, String>` | Free-form metadata |
//!
//! ## Session
//!
//! Bookkeeping record for one conversation. Mutation produces an updated
//! copy (`touched`, `with_appended`, `archived`, ...); there is no shared
//! mutable builder state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tokens::estimate_tokens;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,
    /// Session the message belongs to
    pub session_id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// The actual message content
    pub content: String,
    /// When the message was created; non-decreasing within a session
    pub timestamp: DateTime<Utc>,
    /// Provider-supplied exact token count, if any
    pub token_estimate: Option<u32>,
    /// Importance score (0.0 to 1.0). System messages are fixed at 1.0.
    pub importance: f32,
    /// Free-form metadata
    pub metadata: HashMap<String, String>,
}

impl Message {
    /// Creates a new message with a generated UUID and the current timestamp.
    ///
    /// System messages get importance 1.0; everything else starts at 0.5.
    pub fn new(session_id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        let importance = match role {
            MessageRole::System => 1.0,
            _ => 0.5,
        };
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            token_estimate: None,
            importance,
            metadata: HashMap::new(),
        }
    }

    /// Returns a copy with the given importance, clamped to [0, 1].
    /// System messages keep importance 1.0 regardless.
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = match self.role {
            MessageRole::System => 1.0,
            _ => importance.clamp(0.0, 1.0),
        };
        self
    }

    /// Returns a copy carrying a provider-supplied exact token count.
    pub fn with_token_estimate(mut self, tokens: u32) -> Self {
        self.token_estimate = Some(tokens);
        self
    }

    /// Returns a copy with the given timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns a copy with a metadata entry added.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Resolved token count: the provider-supplied estimate when present,
    /// otherwise the length heuristic. Always resolvable.
    pub fn tokens(&self) -> usize {
        self.token_estimate
            .map(|t| t as usize)
            .unwrap_or_else(|| estimate_tokens(&self.content))
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Active,
    Archived,
    Deleted,
    Expired,
}

/// Kind of conversation a session carries; selects the default
/// optimization strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SessionType {
    Chat,
    Task,
    Workflow,
    Collaborative,
}

/// Default token budget for newly opened sessions.
pub const DEFAULT_TOKEN_BUDGET: usize = 8000;

/// Bookkeeping record for one conversation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Session identifier (caller-supplied)
    pub id: String,
    /// Participants (user ids, character ids)
    pub participant_ids: Vec<String>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Conversation kind
    pub session_type: SessionType,
    /// Token budget used when the caller does not supply one
    pub token_budget: usize,
    /// Running sum of appended message tokens
    pub running_token_count: usize,
    /// Number of appended messages (monotonic; unaffected by compaction)
    pub message_count: usize,
    /// When the session was first opened
    pub created_at: DateTime<Utc>,
    /// Last append/read activity
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Opens a new active session with the default token budget.
    pub fn new(id: impl Into<String>, session_type: SessionType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            participant_ids: Vec::new(),
            status: SessionStatus::Active,
            session_type,
            token_budget: DEFAULT_TOKEN_BUDGET,
            running_token_count: 0,
            message_count: 0,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Returns a copy with the given participants.
    pub fn with_participants(mut self, participant_ids: Vec<String>) -> Self {
        self.participant_ids = participant_ids;
        self
    }

    /// Returns a copy with the given token budget.
    pub fn with_token_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    /// Returns a copy with refreshed activity time.
    pub fn touched(mut self) -> Self {
        self.last_active_at = Utc::now();
        self
    }

    /// Returns a copy accounting for `messages` appended messages worth
    /// `tokens` tokens, with refreshed activity time.
    pub fn with_appended(mut self, messages: usize, tokens: usize) -> Self {
        self.message_count += messages;
        self.running_token_count += tokens;
        self.last_active_at = Utc::now();
        self
    }

    /// Returns a copy with zeroed counters (after a store clear).
    pub fn cleared(mut self) -> Self {
        self.message_count = 0;
        self.running_token_count = 0;
        self
    }

    /// Returns an archived copy.
    pub fn archived(mut self) -> Self {
        self.status = SessionStatus::Archived;
        self
    }

    /// Returns an expired copy.
    pub fn expired(mut self) -> Self {
        self.status = SessionStatus::Expired;
        self
    }

    /// Fraction of the session budget consumed by appended messages.
    pub fn token_usage_rate(&self) -> f64 {
        if self.token_budget == 0 {
            return 0.0;
        }
        self.running_token_count as f64 / self.token_budget as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_importance_is_pinned() {
        let msg = Message::new("s1", MessageRole::System, "rules").with_importance(0.2);
        assert_eq!(msg.importance, 1.0);

        let msg = Message::new("s1", MessageRole::User, "hi").with_importance(0.2);
        assert_eq!(msg.importance, 0.2);
    }

    #[test]
    fn test_importance_clamped() {
        let msg = Message::new("s1", MessageRole::User, "hi").with_importance(3.0);
        assert_eq!(msg.importance, 1.0);
        let msg = Message::new("s1", MessageRole::User, "hi").with_importance(-1.0);
        assert_eq!(msg.importance, 0.0);
    }

    #[test]
    fn test_tokens_prefers_provider_estimate() {
        let msg = Message::new("s1", MessageRole::User, "a very long sentence");
        assert_eq!(msg.tokens(), estimate_tokens("a very long sentence"));

        let msg = msg.with_token_estimate(3);
        assert_eq!(msg.tokens(), 3);
    }

    #[test]
    fn test_session_with_appended() {
        let session = Session::new("s1", SessionType::Chat);
        let session = session.with_appended(2, 30);
        assert_eq!(session.message_count, 2);
        assert_eq!(session.running_token_count, 30);
        assert_eq!(session.status, SessionStatus::Active);
    }
}
