use std::sync::atomic::{AtomicU32, Ordering};

use crate::{Error, Result};

/// Hands out notification identifiers: strictly increasing, starting at 1, never reused.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: AtomicU32::new(1) }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier. Fails once the `u32` space is used up, since 0 means "no id"
    /// on the wire and wrapping would hand out identifiers that may still be referenced.
    pub fn next(&self) -> Result<u32> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| if current == 0 { None } else { Some(current.wrapping_add(1)) })
            .map_err(|_| Error::IdentifiersExhausted)
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next: u32) -> Self {
        Self { next: AtomicU32::new(next) }
    }
}
