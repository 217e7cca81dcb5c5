//! Reset-cause reporting

/// Why the device last came out of reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetCause {
    /// Hardware watchdog expired without being serviced
    Watchdog,
    /// Power-on / brown-out
    PowerOn,
    /// External reset pin
    External,
    /// Software-requested reset
    Software,
    /// Low-power management reset
    LowPower,
    /// Anything the platform cannot classify
    Other,
}

impl ResetCause {
    /// Whether the watchdog caused this reset
    pub const fn is_watchdog(self) -> bool {
        matches!(self, Self::Watchdog)
    }
}

/// Source of the last reset cause
pub trait ResetCauseSource {
    /// Read (and, where the hardware latches it, clear) the reset cause
    fn reset_cause(&mut self) -> ResetCause;
}
