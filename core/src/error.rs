//! Watchdog supervisor error types

/// Rejected compile-time configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Ignore-bit count above 15
    IgnoreBitsOutOfRange { bits: u8 },
    /// Watchdog interval of zero milliseconds
    ZeroInterval,
    /// Nominal oscillator frequency of zero
    ZeroFrequency,
    /// Interval does not fit strictly inside the counter window at the
    /// fastest accepted oscillator frequency
    IntervalTooLong { interval_ms: u32, max_ms: u32 },
    /// `interrupt_enabled` disagrees with the selected policy
    InterruptPolicyMismatch { interrupt_enabled: bool },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IgnoreBitsOutOfRange { bits } => {
                write!(f, "ignore bits {} out of range (0-15)", bits)
            }
            Self::ZeroInterval => write!(f, "watchdog interval is zero"),
            Self::ZeroFrequency => write!(f, "nominal oscillator frequency is zero"),
            Self::IntervalTooLong {
                interval_ms,
                max_ms,
            } => write!(
                f,
                "watchdog interval {} ms exceeds counter window ({} ms max)",
                interval_ms, max_ms
            ),
            Self::InterruptPolicyMismatch { interrupt_enabled } => write!(
                f,
                "interrupt_enabled = {} contradicts the watchdog policy",
                interrupt_enabled
            ),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Unrecoverable initialization / integrity failure
///
/// Every variant means the watchdog cannot be trusted to supervise; the
/// only valid reaction is to halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// Configuration rejected before touching hardware
    Config(ConfigError),
    /// Board / peripheral bring-up failed
    BoardInit,
    /// Ignore bits did not read back as written
    IgnoreBitsReadback { requested: u8, actual: u8 },
    /// Match value did not read back as written
    MatchReadback { written: u16, read: u16 },
    /// Watchdog did not report enabled after enabling
    EnableReadback,
}

impl From<ConfigError> for FatalError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl core::fmt::Display for FatalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::BoardInit => write!(f, "board initialization failed"),
            Self::IgnoreBitsReadback { requested, actual } => write!(
                f,
                "ignore bits readback mismatch (wrote {}, read {})",
                requested, actual
            ),
            Self::MatchReadback { written, read } => write!(
                f,
                "match readback mismatch (wrote {:#06x}, read {:#06x})",
                written, read
            ),
            Self::EnableReadback => write!(f, "watchdog did not report enabled"),
        }
    }
}

impl core::error::Error for FatalError {}

/// Transient oscillator compensation failure
///
/// Never fatal: the caller keeps its last good tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompensationError {
    /// Measurement is stopped (e.g. around deep sleep)
    NotMeasuring,
    /// Measurement has not produced a stable result yet
    NotSettled,
    /// Reading lies outside the oscillator's specified accuracy band
    Implausible { measured_hz: u32 },
}

impl core::fmt::Display for CompensationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMeasuring => write!(f, "measurement not running"),
            Self::NotSettled => write!(f, "measurement not settled"),
            Self::Implausible { measured_hz } => {
                write!(f, "implausible oscillator reading {} Hz", measured_hz)
            }
        }
    }
}

impl core::error::Error for CompensationError {}
