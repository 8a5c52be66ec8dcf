//! # Recall
//!
//! Facade crate for the conversational context and memory engine.
//!
//! The [`MemoryEngine`] is the exposed surface: callers append messages to
//! the bounded short-term store, ask for a token-budgeted
//! [`recall_core::OptimizedContext`] before each model call, and trigger
//! asynchronous long-term memory extraction on conversation batches.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recall::{EngineConfig, MemoryEngine};
//! use recall_core::{Message, MessageRole, ModelClient};
//!
//! # async fn example(
//! #     short_term: Arc<dyn recall_core::ShortTermStore>,
//! #     long_term: Arc<dyn recall_core::LongTermMemoryStore>,
//! #     model: Arc<dyn ModelClient>,
//! # ) -> Result<(), anyhow::Error> {
//! let engine = MemoryEngine::new(short_term, long_term, model, EngineConfig::default());
//!
//! engine
//!     .append_message("session-1", Message::new("session-1", MessageRole::User, "hello"))
//!     .await?;
//! let context = engine.assemble("session-1", Some(4096), None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - engine configuration with env loading
//! - [`session`] - session registry
//! - [`assembler`] - snapshot read + strategy dispatch
//! - [`engine`] - the `MemoryEngine` surface
//!
//! ## External Interactions
//!
//! - **Short-term store**: TTL-capable per-session message log
//! - **Long-term store**: durable memory items and relationships
//! - **Model client**: summarization and primary extraction

pub mod assembler;
pub mod config;
pub mod engine;
pub mod session;

pub use assembler::ContextAssembler;
pub use config::EngineConfig;
pub use engine::{MemoryEngine, ProfileStatistics, SessionStats, SubjectProfile};
pub use session::SessionManager;

pub use recall_core::*;
