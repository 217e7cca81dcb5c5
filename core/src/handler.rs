//! Watchdog expiry interrupt handler
//!
//! Interrupt-mode only. The handler does the bare minimum: mask the source
//! so a delayed main loop cannot cause an interrupt storm, then raise the
//! pending flag. Compensation and match writes happen in the main loop.

use hal_abstractions::WatchdogInterrupt;

use crate::signal::PendingEvent;

/// Interrupt-context half of the watchdog
pub struct ExpiryHandler<'a, I> {
    irq: I,
    pending: &'a PendingEvent,
}

impl<'a, I: WatchdogInterrupt> ExpiryHandler<'a, I> {
    pub const fn new(irq: I, pending: &'a PendingEvent) -> Self {
        Self { irq, pending }
    }

    /// Call from the watchdog interrupt vector
    #[inline]
    pub fn on_expiry(&mut self) {
        self.irq.mask();
        self.pending.raise();
    }
}
