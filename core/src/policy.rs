//! Watchdog recovery strategies

/// What happens when the watchdog match fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogPolicy {
    /// An unserviced match resets the device. No handler is installed.
    Reset,
    /// A match raises an interrupt; the main loop re-arms the next period.
    Interrupt,
}

impl WatchdogPolicy {
    /// Whether the expiry interrupt handler is installed and unmasked
    pub const fn installs_handler(self) -> bool {
        matches!(self, Self::Interrupt)
    }
}

/// Where the next match threshold is measured from when re-arming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatchAnchor {
    /// `last_match + ticks`, falling back to the counter when servicing was
    /// so late that the counter already passed the new target
    ///
    /// Keeps a steady period: interrupt latency does not accumulate.
    LastMatch,
    /// `current_count + ticks`
    ///
    /// Every period is stretched by that cycle's servicing latency.
    Counter,
}
