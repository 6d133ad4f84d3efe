use dnsforward_application::ports::CacheKey;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Insertion order of cache entries.
///
/// A key that is stored again gets a new sequence number; its old position
/// stays queued and is recognised as stale when popped.
#[derive(Default)]
pub struct FifoOrder {
    queue: Mutex<VecDeque<(CacheKey, u64)>>,
}

impl FifoOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, key: CacheKey, seq: u64) {
        self.lock().push_back((key, seq));
    }

    pub fn pop_oldest(&self) -> Option<(CacheKey, u64)> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops queued positions for which `is_live` is false.
    pub fn retain(&self, mut is_live: impl FnMut(&CacheKey, u64) -> bool) {
        self.lock().retain(|(key, seq)| is_live(key, *seq));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(CacheKey, u64)>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
