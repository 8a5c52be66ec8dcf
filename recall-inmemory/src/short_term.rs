//! Bounded, TTL-backed per-session message log.
//!
//! State is sharded by session id: an outer registry maps session ids to
//! independent, mutex-guarded logs. Appends within one session are
//! serialized; sessions never share a lock. Reads may race an in-flight
//! append and observe either state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use recall_core::{Message, ReadSelector, ShortTermStore, StorageError};

/// Capacity, compaction and TTL settings for the short-term store.
#[derive(Debug, Clone)]
pub struct ShortTermConfig {
    /// Maximum messages per session; crossing it triggers compaction
    pub cap: usize,
    /// Fraction of the cap retained after compaction
    pub retention_fraction: f64,
    /// Session time-to-live, refreshed on every append
    pub ttl: Duration,
}

impl Default for ShortTermConfig {
    fn default() -> Self {
        Self {
            cap: 100,
            retention_fraction: 0.7,
            ttl: Duration::days(7),
        }
    }
}

impl ShortTermConfig {
    /// Messages retained after a compaction: `floor(cap * retention_fraction)`.
    pub fn retained(&self) -> usize {
        (self.cap as f64 * self.retention_fraction).floor() as usize
    }
}

/// One session's log plus its expiry deadline.
struct SessionLog {
    messages: Vec<Message>,
    expires_at: DateTime<Utc>,
}

impl SessionLog {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory [`ShortTermStore`] with per-session sharding.
pub struct InMemoryShortTermStore {
    config: ShortTermConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionLog>>>>,
}

impl InMemoryShortTermStore {
    /// Creates a store with default settings (cap 100, retention 0.7, TTL 7 days).
    pub fn new() -> Self {
        Self::with_config(ShortTermConfig::default())
    }

    /// Creates a store with the given settings.
    pub fn with_config(config: ShortTermConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the shard for a session, creating it if absent.
    async fn shard(&self, session_id: &str) -> Arc<Mutex<SessionLog>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(shard) = sessions.get(session_id) {
                return shard.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionLog {
                    messages: Vec::new(),
                    expires_at: Utc::now() + self.config.ttl,
                }))
            })
            .clone()
    }

    /// Returns the shard for a session without creating it.
    async fn live_shard(&self, session_id: &str) -> Option<Arc<Mutex<SessionLog>>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Drops every expired session entry; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut expired = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, shard) in sessions.iter() {
                let log = shard.lock().await;
                if log.is_expired(now) {
                    expired.push(id.clone());
                }
            }
        }
        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for id in expired {
            if sessions.remove(&id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Purged expired short-term sessions");
        }
        removed
    }
}

impl Default for InMemoryShortTermStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShortTermStore for InMemoryShortTermStore {
    async fn append(&self, session_id: &str, messages: Vec<Message>) -> Result<(), StorageError> {
        if messages.is_empty() {
            return Ok(());
        }

        let shard = self.shard(session_id).await;
        let mut log = shard.lock().await;
        let now = Utc::now();

        // An expired entry behaves as absent: start over before appending.
        if log.is_expired(now) && !log.messages.is_empty() {
            debug!(session_id, "Session expired, resetting before append");
            log.messages.clear();
        }

        // Timestamps within a session are non-decreasing.
        let mut last_timestamp = log.messages.last().map(|m| m.timestamp);
        for mut message in messages {
            message.session_id = session_id.to_string();
            if let Some(last) = last_timestamp {
                if message.timestamp < last {
                    message.timestamp = last;
                }
            }
            last_timestamp = Some(message.timestamp);
            log.messages.push(message);
        }

        if log.messages.len() > self.config.cap {
            let keep = self.config.retained();
            let excess = log.messages.len() - keep;
            log.messages.drain(0..excess);
            debug!(
                session_id,
                dropped = excess,
                retained = keep,
                "Compacted session past its cap"
            );
        }

        log.expires_at = now + self.config.ttl;
        Ok(())
    }

    async fn read(&self, session_id: &str, selector: ReadSelector) -> Result<Vec<Message>, StorageError> {
        let Some(shard) = self.live_shard(session_id).await else {
            return Ok(Vec::new());
        };
        let log = shard.lock().await;
        if log.is_expired(Utc::now()) {
            return Ok(Vec::new());
        }
        let messages = match selector {
            ReadSelector::All => log.messages.clone(),
            ReadSelector::LastN(n) => {
                let start = log.messages.len().saturating_sub(n);
                log.messages[start..].to_vec()
            }
            ReadSelector::TimeRange { since, until } => log
                .messages
                .iter()
                .filter(|m| m.timestamp >= since && m.timestamp <= until)
                .cloned()
                .collect(),
        };
        Ok(messages)
    }

    async fn len(&self, session_id: &str) -> Result<usize, StorageError> {
        let Some(shard) = self.live_shard(session_id).await else {
            return Ok(0);
        };
        let log = shard.lock().await;
        if log.is_expired(Utc::now()) {
            return Ok(0);
        }
        Ok(log.messages.len())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StorageError> {
        if let Some(shard) = self.live_shard(session_id).await {
            let mut log = shard.lock().await;
            log.messages.clear();
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn session_ids(&self) -> Result<Vec<String>, StorageError> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        let mut ids = Vec::new();
        for (id, shard) in sessions.iter() {
            let log = shard.lock().await;
            if !log.is_expired(now) {
                ids.push(id.clone());
            }
        }
        Ok(ids)
    }
}
