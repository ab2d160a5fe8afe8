use std::sync::atomic::{AtomicU8, Ordering};

/// Wrapping 8-bit sequence used to tag motor move-to requests.
///
/// `next()` increments before returning, so the first id handed out is 1 and
/// the sequence wraps from 255 back to 0.
#[derive(Debug, Default)]
pub struct OperationIdAllocator {
    current: AtomicU8,
}

impl OperationIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently allocated id (0 before the first allocation).
    pub fn current(&self) -> u8 {
        self.current.load(Ordering::Relaxed)
    }

    /// Allocate the next id.
    pub fn next(&self) -> u8 {
        self.current.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}
