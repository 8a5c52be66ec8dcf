//! Bounded async extraction dispatch.
//!
//! Extraction runs off the request path: `dispatch` hands a batch to a
//! background task and returns immediately. Concurrency is bounded by a
//! semaphore, and extraction for a given subject is serialized: while one
//! task is in flight for a subject, further dispatches for it are skipped
//! (not queued). Once dispatched, a task runs to completion or deadline;
//! callers cannot cancel it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info};

use recall_core::{LongTermMemoryStore, MemoryItem, Message};

use crate::pipeline::ExtractionPipeline;

/// One extraction batch: the subject's recent messages plus optional
/// character/scene scope.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub subject_id: String,
    pub character_id: Option<String>,
    pub scene_id: Option<String>,
    pub messages: Vec<Message>,
}

impl ExtractionRequest {
    pub fn new(subject_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            subject_id: subject_id.into(),
            character_id: None,
            scene_id: None,
            messages,
        }
    }

    pub fn with_character(mut self, character_id: impl Into<String>) -> Self {
        self.character_id = Some(character_id.into());
        self
    }

    pub fn with_scene(mut self, scene_id: impl Into<String>) -> Self {
        self.scene_id = Some(scene_id.into());
        self
    }
}

/// Dispatches extraction batches onto a bounded tokio worker pool and
/// upserts the results into the long-term store.
pub struct ExtractionWorker {
    pipeline: Arc<ExtractionPipeline>,
    store: Arc<dyn LongTermMemoryStore>,
    permits: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ExtractionWorker {
    /// `max_concurrent` bounds how many extraction tasks run at once.
    pub fn new(
        pipeline: Arc<ExtractionPipeline>,
        store: Arc<dyn LongTermMemoryStore>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            pipeline,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Fire-and-forget dispatch. Returns `false` when an extraction for
    /// the same subject is already in flight (the duplicate is skipped,
    /// per-subject extraction stays serialized).
    pub async fn dispatch(&self, request: ExtractionRequest) -> bool {
        let subject_id = request.subject_id.clone();
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(subject_id.clone()) {
                debug!(%subject_id, "Extraction already in flight for subject, skipping dispatch");
                return false;
            }
        }

        let pipeline = self.pipeline.clone();
        let store = self.store.clone();
        let permits = self.permits.clone();
        let in_flight = self.in_flight.clone();
        tokio::spawn(async move {
            match permits.acquire_owned().await {
                Ok(_permit) => run_extraction(pipeline, store, request).await,
                Err(_) => error!(subject_id = %subject_id, "Extraction worker pool closed"),
            }
            in_flight.lock().await.remove(&subject_id);
        });
        true
    }

    /// Number of subjects currently being extracted.
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Waits until every dispatched task has finished. Intended for tests
    /// and shutdown paths, not the request path.
    pub async fn wait_idle(&self) {
        loop {
            if self.in_flight.lock().await.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Runs every applicable category for one batch and upserts the survivors.
/// Category failures are logged and do not stop the other categories.
async fn run_extraction(
    pipeline: Arc<ExtractionPipeline>,
    store: Arc<dyn LongTermMemoryStore>,
    request: ExtractionRequest,
) {
    let ExtractionRequest {
        subject_id,
        character_id,
        scene_id,
        messages,
    } = request;

    if messages.is_empty() {
        return;
    }

    let mut extracted: Vec<MemoryItem> = Vec::new();

    match pipeline.extract_facts(&subject_id, &messages).await {
        Ok(items) => extracted.extend(items),
        Err(e) => error!(%subject_id, error = %e, "Fact extraction failed"),
    }
    match pipeline.extract_preferences(&subject_id, &messages).await {
        Ok(items) => extracted.extend(items),
        Err(e) => error!(%subject_id, error = %e, "Preference extraction failed"),
    }
    match pipeline.extract_episodic(&subject_id, &messages).await {
        Ok(items) => extracted.extend(items),
        Err(e) => error!(%subject_id, error = %e, "Episodic extraction failed"),
    }

    if let Some(character_id) = &character_id {
        match pipeline
            .extract_character_memories(&subject_id, character_id, &messages)
            .await
        {
            Ok(items) => extracted.extend(items),
            Err(e) => error!(%subject_id, %character_id, error = %e, "Character extraction failed"),
        }
        if let Some(scene_id) = &scene_id {
            match pipeline
                .extract_scene_memories(character_id, scene_id, &messages)
                .await
            {
                Ok(items) => extracted.extend(items),
                Err(e) => error!(%character_id, %scene_id, error = %e, "Scene extraction failed"),
            }
        }
    }

    let total = extracted.len();
    let mut stored = 0usize;
    for item in extracted {
        match store.upsert(item).await {
            Ok(_) => stored += 1,
            Err(e) => error!(%subject_id, error = %e, "Failed to store extracted item"),
        }
    }

    info!(%subject_id, total, stored, "Extraction batch finished");
}
