//! Watchdog timer peripheral
//!
//! The watchdog is modelled as a free-running 16-bit counter clocked by the
//! low-accuracy oscillator, compared against a software-owned match value.
//! A match either latches an interrupt or, when left unserviced in reset
//! mode, restarts the device.

/// Free-running watchdog counter with a match comparator
///
/// There is no `disable`: once enabled, a supervisory watchdog stays on.
pub trait WatchdogCounter {
    /// Set how many most-significant counter bits the comparator ignores (0-15)
    fn set_ignore_bits(&mut self, bits: u8);

    /// Read back the ignore-bit setting actually latched by the hardware
    fn ignore_bits(&self) -> u8;

    /// Write the match threshold
    fn set_match(&mut self, value: u16);

    /// Read back the match threshold
    fn match_value(&self) -> u16;

    /// Current counter value (hardware-owned)
    fn counter(&self) -> u16;

    /// Activate the watchdog
    fn enable(&mut self);

    /// Whether the hardware reports the watchdog as active
    fn is_enabled(&self) -> bool;

    /// Clear the latched match event
    ///
    /// In reset mode this is what services the watchdog.
    fn clear_interrupt(&mut self);

    /// Whether a match event is latched
    fn interrupt_status(&self) -> bool;
}

/// Mask control for the watchdog match interrupt
///
/// Split from [`WatchdogCounter`] so the interrupt handler can own a cheap
/// handle while the main loop owns the counter.
pub trait WatchdogInterrupt {
    /// Stop match events from raising the interrupt
    fn mask(&mut self);

    /// Let match events raise the interrupt again
    fn unmask(&mut self);

    /// Whether the interrupt is currently masked
    fn is_masked(&self) -> bool;
}
