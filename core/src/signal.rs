//! Pending-expiry signal between the interrupt handler and the main loop

use core::sync::atomic::{AtomicBool, Ordering};

/// Single-producer / single-consumer expiry flag
///
/// Raised only by the interrupt handler, observed and cleared only by the
/// supervisory loop. The watchdog interrupt is masked for the whole
/// raise→clear window, so no read-modify-write is needed: plain `load` and
/// `store` also work on ARMv6-M, which has no compare-and-swap.
#[derive(Debug)]
pub struct PendingEvent {
    flag: AtomicBool,
}

impl PendingEvent {
    /// Create a cleared flag (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Signal a pending expiry (interrupt context)
    #[inline]
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether an expiry is waiting to be serviced
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Mark the expiry as fully serviced (main loop)
    #[inline]
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for PendingEvent {
    fn default() -> Self {
        Self::new()
    }
}
