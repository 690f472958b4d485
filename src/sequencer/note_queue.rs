// Note queue - scheduled beats waiting to be picked up by a polling consumer
// Producer: the scheduler (in beat order). Consumer: visual layer / render loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Immutable fact: bar-relative beat `beat` is due at clock time `time`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub beat: u32,
    pub time: f64,
}

impl ScheduledNote {
    pub fn new(beat: u32, time: f64) -> Self {
        Self { beat, time }
    }
}

/// Shared FIFO of scheduled notes
///
/// Clones share the same buffer. Each `poll` is a single drain pass under
/// the lock, so every note is returned exactly once.
#[derive(Debug, Clone, Default)]
pub struct NoteQueue {
    inner: Arc<Mutex<VecDeque<ScheduledNote>>>,
}

impl NoteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ScheduledNote>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a note (notes arrive in ascending time order)
    pub fn push(&self, note: ScheduledNote) {
        self.lock().push_back(note);
    }

    /// Remove and return every note with `time <= now`, oldest first
    pub fn poll(&self, now: f64) -> Vec<ScheduledNote> {
        let mut queue = self.lock();
        let due = queue.iter().take_while(|note| note.time <= now).count();
        queue.drain(..due).collect()
    }

    /// Drop queued notes scheduled at or after `time`
    /// Returns how many were discarded
    pub fn discard_from(&self, time: f64) -> usize {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|note| note.time < time);
        before - queue.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
