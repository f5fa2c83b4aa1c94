//! Session-lifetime log of every joke fetched successfully.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use shared::domain::{HistoryEntry, HistoryEntryId, NormalizedJoke};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Appended(HistoryEntry),
    Evicted(HistoryEntryId),
    Cleared,
}

/// Bounded, most-recent-first history.
///
/// Every operation runs inside one critical section, so concurrent refreshes
/// can append without breaking ordering or capacity. Ids embed a sequence
/// number that survives [`HistoryStore::clear`] and is never reissued.
pub struct HistoryStore {
    capacity: usize,
    inner: Mutex<HistoryState>,
    events: broadcast::Sender<HistoryEvent>,
}

struct HistoryState {
    // front = most recent
    entries: VecDeque<HistoryEntry>,
    next_sequence: u64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// `capacity` is clamped to at least one entry.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (events, _) = broadcast::channel(256);
        Self {
            capacity,
            inner: Mutex::new(HistoryState {
                entries: VecDeque::with_capacity(capacity),
                next_sequence: 0,
            }),
            events,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn append(&self, joke: NormalizedJoke) -> HistoryEntry {
        self.append_at(joke, Utc::now()).await
    }

    pub(crate) async fn append_at(
        &self,
        joke: NormalizedJoke,
        created_at: DateTime<Utc>,
    ) -> HistoryEntry {
        let mut guard = self.inner.lock().await;
        let sequence = guard.next_sequence;
        guard.next_sequence += 1;

        let id = HistoryEntryId::new(created_at, sequence);
        let entry = HistoryEntry::from_joke(id, created_at, joke);
        guard.entries.push_front(entry.clone());
        let _ = self.events.send(HistoryEvent::Appended(entry.clone()));

        while guard.entries.len() > self.capacity {
            if let Some(evicted) = guard.entries.pop_back() {
                debug!(id = %evicted.id, "history: evicted oldest entry");
                let _ = self.events.send(HistoryEvent::Evicted(evicted.id));
            }
        }

        entry
    }

    pub async fn list(&self) -> Vec<HistoryEntry> {
        let guard = self.inner.lock().await;
        guard.entries.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    pub async fn clear(&self) {
        let mut guard = self.inner.lock().await;
        let removed = guard.entries.len();
        guard.entries.clear();
        debug!(removed, "history: cleared");
        let _ = self.events.send(HistoryEvent::Cleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
