//! Store preview loading for the MEGRIBI dashboard.
//!
//! This crate provides:
//! - Backend sources (HTTP and test doubles) behind one trait
//! - Concurrent range/forecast fetching with stale-request protection
//! - Per-store, per-day feedback voting over an injected key-value store

pub mod source;
pub mod loader;
pub mod store;
pub mod feedback;

pub use source::{ForecastKind, HttpSource, PreviewSource};
pub use loader::{PreviewLoader, PreviewOutcome, RequestGuard, RequestTicket};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use feedback::{FeedbackCounts, FeedbackOption, FeedbackPoll, FeedbackState};
