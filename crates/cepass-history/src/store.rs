//! The bounded, concurrency-safe event buffer.
//!
//! All mutation goes through [`EventHistory::record`], which appends under
//! an exclusive lock and evicts the oldest entry once the buffer is at
//! capacity. Reads go through [`EventHistory::snapshot`], which takes the
//! same lock, so a snapshot is always a consistent point-in-time view and
//! a `record` that has returned is visible to every later snapshot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cloudevents::Event;

/// Default capacity of the event history buffer.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A bounded, insertion-ordered buffer of received CloudEvents.
///
/// Cloning is cheap and shares the underlying buffer, so one instance can
/// be handed to both the receiver callback and the HTTP dispatcher.
///
/// The capacity is a strict cap: the observable length never exceeds the
/// configured limit. A limit of zero disables the bound entirely.
#[derive(Clone, Debug)]
pub struct EventHistory {
    inner: Arc<Mutex<VecDeque<Event>>>,
    limit: usize,
}

impl EventHistory {
    /// Creates an empty history bounded at `limit` events.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            limit,
        }
    }

    /// Appends `event`, evicting the oldest entry if the buffer is full.
    ///
    /// Never fails and applies no backpressure; the caller is expected to
    /// treat recording as a diagnostic side effect, not a durable write.
    pub fn record(&self, event: Event) {
        let mut buf = self.lock();
        if self.limit > 0 {
            while buf.len() >= self.limit {
                buf.pop_front();
            }
        }
        buf.push_back(event);
    }

    /// Returns a point-in-time copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().iter().cloned().collect()
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the buffer holds no events.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The configured capacity (zero means unbounded).
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Event>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panicked writer must not wedge a diagnostic buffer; the
                // worst outcome of recovering is one stale or missing event.
                tracing::error!("event history lock poisoned, recovering with current contents");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
