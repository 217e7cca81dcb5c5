//! Compile-time watchdog configuration
//!
//! The constants are the recognised build options. [`SupervisorConfig`]
//! bundles them so a board (or a test) can override individual values and
//! validate the result once at start-up.

use crate::compensator::{accuracy_band, ticks_for_interval};
use crate::error::ConfigError;
use crate::policy::{MatchAnchor, WatchdogPolicy};

/// Selected recovery strategy
pub const WDT_DEMO: WatchdogPolicy = WatchdogPolicy::Interrupt;

/// ILO nominal frequency in Hz
pub const ILO_FREQUENCY_HZ: u32 = 40_000;

/// ILO accuracy band around nominal, in percent
pub const ILO_ACCURACY_PERCENT: u32 = 60;

/// On/off time of one reset-cause blink in milliseconds
pub const BLINK_DELAY_MS: u32 = 500;

/// WDT interrupt period in milliseconds
///
/// Must stay under the counter window at the fastest ILO the accuracy band
/// allows: 1023 ms with no ignore bits at 40 kHz ±60 %.
pub const WDT_INTERRUPT_INTERVAL_MS: u32 = 1000;

/// WDT interrupt priority (0 = most urgent)
pub const WDT_INTERRUPT_PRIORITY: u8 = 0;

/// Counter bits ignored by the match comparator
pub const IGNORE_BITS: u8 = 0;

/// Waiting time, in milliseconds, for the ILO to start up
pub const ILO_START_UP_TIME_MS: u32 = 2;

/// Re-arm strategy for interrupt mode
pub const MATCH_ANCHOR: MatchAnchor = MatchAnchor::LastMatch;

/// Width of the hardware watchdog counter
pub const COUNTER_BITS: u8 = 16;

/// Largest accepted ignore-bit count
pub const MAX_IGNORE_BITS: u8 = 15;

/// Number of counter ticks before the (masked) counter wraps
pub const fn window_ticks(ignore_bits: u8) -> u32 {
    let bits = if ignore_bits > MAX_IGNORE_BITS {
        MAX_IGNORE_BITS
    } else {
        ignore_bits
    };
    1u32 << (COUNTER_BITS - bits) as u32
}

/// Watchdog peripheral settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogConfig {
    /// Most-significant counter bits ignored by the comparator (0-15)
    pub ignore_bits: u8,
    /// Whether a match raises the expiry interrupt; must agree with the
    /// policy, see [`SupervisorConfig::validate`]
    pub interrupt_enabled: bool,
    /// Interrupt controller priority of the expiry interrupt
    ///
    /// Descriptive: the priority is fixed where the board binds the
    /// handler, which checks it against [`WDT_INTERRUPT_PRIORITY`] at build
    /// time.
    pub interrupt_priority: u8,
}

impl WatchdogConfig {
    /// Settings from the build constants for the given policy
    pub const fn new(policy: WatchdogPolicy) -> Self {
        Self {
            ignore_bits: IGNORE_BITS,
            interrupt_enabled: policy.installs_handler(),
            interrupt_priority: WDT_INTERRUPT_PRIORITY,
        }
    }
}

/// Everything the supervisory loop needs to arm and run the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorConfig {
    pub policy: WatchdogPolicy,
    /// Nominal oscillator frequency (Hz), used until a measurement succeeds
    pub nominal_hz: u32,
    /// Desired watchdog period in milliseconds
    pub interval_ms: u32,
    pub watchdog: WatchdogConfig,
    /// Oscillator start-up settling delay in milliseconds
    pub ilo_startup_ms: u32,
    /// Reset-cause blink on/off time in milliseconds
    pub blink_delay_ms: u32,
    pub match_anchor: MatchAnchor,
}

impl SupervisorConfig {
    /// Configuration from the build constants
    pub const fn new(policy: WatchdogPolicy) -> Self {
        Self {
            policy,
            nominal_hz: ILO_FREQUENCY_HZ,
            interval_ms: WDT_INTERRUPT_INTERVAL_MS,
            watchdog: WatchdogConfig::new(policy),
            ilo_startup_ms: ILO_START_UP_TIME_MS,
            blink_delay_ms: BLINK_DELAY_MS,
            match_anchor: MATCH_ANCHOR,
        }
    }

    /// Desired watchdog period in microseconds
    pub const fn desired_interval_us(&self) -> u32 {
        self.interval_ms.saturating_mul(1000)
    }

    /// Fastest oscillator frequency compensation will accept
    pub const fn fastest_hz(&self) -> u32 {
        accuracy_band(self.nominal_hz, ILO_ACCURACY_PERCENT).1
    }

    /// Longest interval (ms) whose tick count fits the counter window even
    /// at [`fastest_hz`](Self::fastest_hz)
    pub const fn max_interval_ms(&self) -> u32 {
        let fastest = self.fastest_hz();
        if fastest == 0 {
            return 0;
        }
        let max_ticks = window_ticks(self.watchdog.ignore_bits) as u64 - 1;
        (max_ticks * 1000 / fastest as u64) as u32
    }

    /// Check the configuration before any hardware is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watchdog.ignore_bits > MAX_IGNORE_BITS {
            return Err(ConfigError::IgnoreBitsOutOfRange {
                bits: self.watchdog.ignore_bits,
            });
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.nominal_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }

        if self.watchdog.interrupt_enabled != self.policy.installs_handler() {
            return Err(ConfigError::InterruptPolicyMismatch {
                interrupt_enabled: self.watchdog.interrupt_enabled,
            });
        }

        // Every accepted measurement must still fit, or re-arming would
        // alias onto a shorter period.
        let worst_ticks = ticks_for_interval(self.desired_interval_us(), self.fastest_hz());
        if worst_ticks >= window_ticks(self.watchdog.ignore_bits) {
            return Err(ConfigError::IntervalTooLong {
                interval_ms: self.interval_ms,
                max_ms: self.max_interval_ms(),
            });
        }
        Ok(())
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new(WDT_DEMO)
    }
}
