//! Session registry.
//!
//! Keeps one immutable [`Session`] value per live session; every mutation
//! replaces the stored value with an updated copy. No ambient or
//! thread-local session state: callers address sessions by id.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;

use recall_core::{Session, SessionStatus, SessionType};

/// Registry of live sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the session, creating an active one of the given type on
    /// first use.
    pub async fn open(&self, session_id: &str, session_type: SessionType) -> Session {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(session_id) {
                return session.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!(session_id, ?session_type, "Opened session");
                Session::new(session_id, session_type)
            })
            .clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Replaces the stored session with `f(current)`; returns the updated
    /// copy, or `None` for an unknown session.
    pub async fn update<F>(&self, session_id: &str, f: F) -> Option<Session>
    where
        F: FnOnce(Session) -> Session,
    {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(session_id)?.clone();
        let updated = f(current);
        sessions.insert(session_id.to_string(), updated.clone());
        Some(updated)
    }

    /// Marks a session archived.
    pub async fn archive(&self, session_id: &str) -> Option<Session> {
        let archived = self.update(session_id, Session::archived).await;
        if archived.is_some() {
            info!(session_id, "Archived session");
        }
        archived
    }

    /// Drops the session from the registry.
    pub async fn remove(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    pub async fn ids(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }

    /// Marks every active session idle for longer than `idle` as expired;
    /// returns their ids.
    pub async fn expire_idle(&self, idle: Duration) -> Vec<String> {
        let cutoff = Utc::now() - idle;
        let mut sessions = self.sessions.write().await;
        let mut expired = Vec::new();
        for (id, session) in sessions.iter_mut() {
            if session.status == SessionStatus::Active && session.last_active_at < cutoff {
                *session = session.clone().expired();
                expired.push(id.clone());
            }
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired idle sessions");
        }
        expired
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
