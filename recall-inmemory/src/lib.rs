//! # In-Memory Stores
//!
//! In-memory implementations of the `recall-core` store traits.
//!
//! - [`InMemoryShortTermStore`] - bounded, TTL-backed per-session message
//!   log with compaction; the reference implementation of the short-term
//!   semantics
//! - [`InMemoryLongTermStore`] - upsert-by-composite-key memory store with
//!   relationship tracking
//!
//! **Advantages**:
//! - Fastest performance (no I/O)
//! - Simple to set up and use
//! - Great for testing and prototyping
//!
//! **Limitations**:
//! - Data is lost on restart
//! - Limited by available memory
//!
//! ## Thread Safety
//!
//! Both stores use `tokio::sync` primitives for concurrent access. The
//! short-term store shards per session: one mutex per session log, so
//! appends to different sessions never contend.

mod long_term;
mod short_term;

pub use long_term::InMemoryLongTermStore;
pub use short_term::{InMemoryShortTermStore, ShortTermConfig};
