use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique track identifiers for one tracker.
///
/// Identifiers start at 1 and are never handed out twice until `reset`.
#[derive(Debug, Default)]
pub struct TrackIdAllocator {
    counter: AtomicU64,
}

impl TrackIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next unique track ID.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reset the counter (useful for testing).
    pub fn reset(&self) {
        self.counter.store(0, Ordering::SeqCst);
    }
}
