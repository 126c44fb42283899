use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Busy indicator shown while a request is in flight.
///
/// Set through [`BusyFlag::enter`]; the returned guard clears it when dropped, so
/// the flag resets on success, failure, and early return alike.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    active: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> BusyGuard {
        self.active.store(true, Ordering::Release);
        BusyGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
#[must_use = "the busy flag clears as soon as the guard is dropped"]
pub struct BusyGuard {
    active: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
