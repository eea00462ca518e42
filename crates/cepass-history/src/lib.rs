//! Bounded in-memory history of received CloudEvents.
//!
//! The passthrough service keeps the most recent events it has handled so
//! they can be dumped over HTTP for debugging and smoke-testing event
//! sources. [`EventHistory`] is that buffer: insertion-ordered, capped at a
//! fixed limit with FIFO eviction, and safe to share across request tasks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cepass_history::EventHistory;
//!
//! let history = EventHistory::new(100);
//! history.record(event);
//! let recent = history.snapshot();
//! ```
//!
//! The buffer is purely in-memory; its contents are lost on restart.

mod store;

pub use store::{EventHistory, DEFAULT_HISTORY_LIMIT};
