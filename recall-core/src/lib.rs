//! # Recall Core
//!
//! Core types and traits for the conversational context and memory engine.
//! Used by the store backends (`recall-inmemory`, `recall-sqlite`), the
//! context strategies (`recall-strategies`), the extraction pipeline
//! (`recall-extraction`) and the `recall` facade crate.
//!
//! ## Modules
//!
//! - [`types`] - Message, Session and their enums
//! - [`context`] - Summary, OptimizedContext, StrategyKind
//! - [`memory`] - MemoryItem, RelationshipMemory and related value types
//! - [`store`] - ShortTermStore and LongTermMemoryStore traits
//! - [`model`] - ModelClient trait (generative-model call contract)
//! - [`error`] - StorageError, ExtractionError, ValidationError
//! - [`tokens`] - token estimation heuristic
//! - [`logger`] - tracing bootstrap

pub mod context;
pub mod error;
pub mod logger;
pub mod memory;
pub mod model;
pub mod store;
pub mod tokens;
pub mod types;

pub use context::*;
pub use error::*;
pub use memory::*;
pub use model::*;
pub use store::*;
pub use tokens::{estimate_tokens, CHARS_PER_TOKEN};
pub use types::*;
