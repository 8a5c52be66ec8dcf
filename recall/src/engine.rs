//! The engine surface exposed to callers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use recall_core::{
    Interaction, LongTermMemoryStore, MemoryFilter, MemoryItem, MemoryKind, Message, ModelClient,
    OptimizedContext, Page, ReadSelector, RelationshipMemory, Session, SessionStatus, SessionType,
    ShortTermStore, StorageError, StrategyKind,
};
use recall_extraction::{
    ExtractionPipeline, ExtractionRequest, ExtractionWorker, MemoryExtractor, ModelExtractor,
    RuleBasedExtractor,
};
use recall_strategies::StrategyRegistry;

use crate::assembler::ContextAssembler;
use crate::config::EngineConfig;
use crate::session::SessionManager;

/// Point-in-time view of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Messages currently held in the short-term store (post-compaction)
    pub message_count: usize,
    /// Tokens currently held in the short-term store
    pub total_tokens: usize,
    /// Compression ratio of the most recent assembly (1.0 before any)
    pub compression_ratio: f64,
    pub status: SessionStatus,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            message_count: 0,
            total_tokens: 0,
            compression_ratio: 1.0,
            status: SessionStatus::Active,
        }
    }
}

/// Counting statistics for a subject profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStatistics {
    pub total_facts: usize,
    pub total_preferences: usize,
    pub total_episodic: usize,
    /// Items with importance 0.8 and above
    pub high_importance: usize,
}

/// Aggregate view of everything remembered about a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub subject_id: String,
    pub facts: Vec<MemoryItem>,
    pub preferences: Vec<MemoryItem>,
    pub episodic: Vec<MemoryItem>,
    pub statistics: ProfileStatistics,
}

/// Conversational context and memory engine.
///
/// Coordinates the bounded short-term store, the context assembler and the
/// asynchronous extraction pipeline behind one surface. All state is
/// addressed explicitly by session/subject id; there is no ambient
/// request-scoped context.
pub struct MemoryEngine {
    short_term: Arc<dyn ShortTermStore>,
    long_term: Arc<dyn LongTermMemoryStore>,
    sessions: SessionManager,
    assembler: ContextAssembler,
    worker: ExtractionWorker,
    last_compression: RwLock<HashMap<String, f64>>,
    config: EngineConfig,
}

impl MemoryEngine {
    /// Wires the engine with the default strategy registry and the
    /// model-primary / rule-fallback extraction pipeline.
    pub fn new(
        short_term: Arc<dyn ShortTermStore>,
        long_term: Arc<dyn LongTermMemoryStore>,
        model: Arc<dyn ModelClient>,
        config: EngineConfig,
    ) -> Self {
        let registry = StrategyRegistry::with_defaults(model.clone());

        let primary: Option<Arc<dyn MemoryExtractor>> = if config.enable_model_extraction {
            Some(Arc::new(
                ModelExtractor::new(model).with_deadline(config.model_deadline),
            ))
        } else {
            None
        };
        let pipeline = Arc::new(
            ExtractionPipeline::new(primary, Arc::new(RuleBasedExtractor::new()))
                .with_confidence_threshold(config.confidence_threshold),
        );
        let worker = ExtractionWorker::new(pipeline, long_term.clone(), config.extraction_workers);

        Self {
            assembler: ContextAssembler::new(short_term.clone(), registry),
            short_term,
            long_term,
            sessions: SessionManager::new(),
            worker,
            last_compression: RwLock::new(HashMap::new()),
            config,
        }
    }

    // ---- session lifecycle ----

    /// Opens (or returns) a session of the given type.
    pub async fn open_session(&self, session_id: &str, session_type: SessionType) -> Session {
        self.sessions.open(session_id, session_type).await
    }

    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).await
    }

    /// Marks a session archived; its history stays readable until TTL or
    /// deletion.
    pub async fn archive_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.archive(session_id).await
    }

    /// Removes a session and its short-term history.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), StorageError> {
        self.short_term.delete(session_id).await?;
        self.sessions.remove(session_id).await;
        self.last_compression.write().await.remove(session_id);
        info!(session_id, "Deleted session");
        Ok(())
    }

    /// Clears a session's history but keeps the session open.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), StorageError> {
        self.short_term.clear(session_id).await?;
        self.sessions.update(session_id, Session::cleared).await;
        Ok(())
    }

    /// Ids of sessions with live short-term history.
    pub async fn session_ids(&self) -> Result<Vec<String>, StorageError> {
        self.short_term.session_ids().await
    }

    /// Marks sessions idle beyond `idle` as expired and drops their
    /// short-term history; returns the expired ids.
    pub async fn expire_idle_sessions(&self, idle: Duration) -> Result<Vec<String>, StorageError> {
        let expired = self.sessions.expire_idle(idle).await;
        for session_id in &expired {
            self.short_term.delete(session_id).await?;
        }
        Ok(expired)
    }

    // ---- message path ----

    /// Appends one message, opening the session on first use.
    pub async fn append_message(&self, session_id: &str, message: Message) -> Result<(), StorageError> {
        self.append_messages(session_id, vec![message]).await
    }

    /// Appends a batch in order, opening the session on first use and
    /// updating its counters.
    pub async fn append_messages(
        &self,
        session_id: &str,
        messages: Vec<Message>,
    ) -> Result<(), StorageError> {
        if messages.is_empty() {
            return Ok(());
        }
        let count = messages.len();
        let tokens: usize = messages.iter().map(|m| m.tokens()).sum();

        self.sessions.open(session_id, SessionType::Chat).await;
        self.short_term.append(session_id, messages).await?;
        self.sessions
            .update(session_id, |s| s.with_appended(count, tokens))
            .await;

        debug!(session_id, count, tokens, "Appended messages");
        Ok(())
    }

    /// Reads session history directly (insertion order; empty for unknown
    /// sessions).
    pub async fn read_messages(
        &self,
        session_id: &str,
        selector: ReadSelector,
    ) -> Result<Vec<Message>, StorageError> {
        self.short_term.read(session_id, selector).await
    }

    // ---- context assembly ----

    /// Assembles a token-budgeted context for the next model call.
    ///
    /// `token_budget` falls back to the session's budget, then to the
    /// configured default. `strategy` overrides the session-type default
    /// table. Absent sessions yield an empty context.
    pub async fn assemble(
        &self,
        session_id: &str,
        token_budget: Option<usize>,
        strategy: Option<StrategyKind>,
    ) -> Result<OptimizedContext, anyhow::Error> {
        let session = self.sessions.get(session_id).await;
        let session_type = session
            .as_ref()
            .map(|s| s.session_type)
            .unwrap_or(SessionType::Chat);
        let budget = token_budget
            .or(session.as_ref().map(|s| s.token_budget))
            .unwrap_or(self.config.default_token_budget);

        let context = self
            .assembler
            .assemble(session_id, session_type, budget, strategy, None)
            .await?;

        self.last_compression
            .write()
            .await
            .insert(session_id.to_string(), context.compression_ratio());
        self.sessions.update(session_id, Session::touched).await;

        Ok(context)
    }

    /// Point-in-time stats for a session; defaults for unknown sessions
    /// (absence is not an error).
    pub async fn stats(&self, session_id: &str) -> Result<SessionStats, StorageError> {
        let messages = self.short_term.read(session_id, ReadSelector::All).await?;
        let compression_ratio = self
            .last_compression
            .read()
            .await
            .get(session_id)
            .copied()
            .unwrap_or(1.0);
        let status = self
            .sessions
            .get(session_id)
            .await
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Active);

        Ok(SessionStats {
            message_count: messages.len(),
            total_tokens: messages.iter().map(|m| m.tokens()).sum(),
            compression_ratio,
            status,
        })
    }

    // ---- long-term memory ----

    /// Fire-and-forget extraction for a subject's batch; returns `false`
    /// when an extraction for the subject is already in flight.
    pub async fn trigger_extraction(&self, subject_id: &str, messages: Vec<Message>) -> bool {
        self.worker
            .dispatch(ExtractionRequest::new(subject_id, messages))
            .await
    }

    /// Character- (and optionally scene-) scoped extraction variant.
    pub async fn trigger_character_extraction(
        &self,
        subject_id: &str,
        character_id: &str,
        scene_id: Option<&str>,
        messages: Vec<Message>,
    ) -> bool {
        let mut request = ExtractionRequest::new(subject_id, messages).with_character(character_id);
        if let Some(scene_id) = scene_id {
            request = request.with_scene(scene_id);
        }
        self.worker.dispatch(request).await
    }

    /// Filtered, paginated read of a subject's long-term memories.
    pub async fn query_memories(
        &self,
        subject_id: &str,
        filter: MemoryFilter,
        page: Page,
    ) -> Result<Vec<MemoryItem>, StorageError> {
        self.long_term.query(subject_id, filter, page).await
    }

    /// Stores a manually curated memory item directly.
    pub async fn save_memory(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        self.long_term.upsert(item).await
    }

    /// Records interaction evidence for a relationship.
    pub async fn record_interaction(
        &self,
        subject_id: &str,
        related_id: &str,
        interaction: Interaction,
    ) -> Result<RelationshipMemory, StorageError> {
        self.long_term
            .record_interaction(subject_id, related_id, interaction)
            .await
    }

    pub async fn get_relationship(
        &self,
        subject_id: &str,
        related_id: &str,
    ) -> Result<Option<RelationshipMemory>, StorageError> {
        self.long_term.get_relationship(subject_id, related_id).await
    }

    /// Aggregate view of everything remembered about a subject.
    pub async fn subject_profile(&self, subject_id: &str) -> Result<SubjectProfile, StorageError> {
        let items = self
            .long_term
            .query(
                subject_id,
                MemoryFilter::default(),
                Page {
                    offset: 0,
                    limit: 500,
                },
            )
            .await?;

        let mut facts = Vec::new();
        let mut preferences = Vec::new();
        let mut episodic = Vec::new();
        let mut high_importance = 0usize;
        for item in items {
            if item.importance >= 0.8 {
                high_importance += 1;
            }
            match item.kind {
                MemoryKind::Fact => facts.push(item),
                MemoryKind::Preference => preferences.push(item),
                MemoryKind::Episodic => episodic.push(item),
            }
        }

        Ok(SubjectProfile {
            subject_id: subject_id.to_string(),
            statistics: ProfileStatistics {
                total_facts: facts.len(),
                total_preferences: preferences.len(),
                total_episodic: episodic.len(),
                high_importance,
            },
            facts,
            preferences,
            episodic,
        })
    }

    /// Removes every long-term record for a subject; returns how many
    /// records were deleted.
    pub async fn forget_subject(&self, subject_id: &str) -> Result<u64, StorageError> {
        self.long_term.delete_for_subject(subject_id).await
    }

    /// Waits for all in-flight extraction to finish. For tests and
    /// shutdown paths.
    pub async fn wait_for_extraction_idle(&self) {
        self.worker.wait_idle().await;
    }
}
