//! Reset-cause indication at boot
//!
//! Informational only: the blink pattern never changes how the watchdog is
//! armed.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use hal_abstractions::{ResetCause, ResetCauseSource};

use crate::indicator::Indicator;

/// Blinks after a watchdog reset
pub const WATCHDOG_RESET_BLINKS: u8 = 3;

/// Blinks after any other reset (power-on, external, software)
pub const OTHER_RESET_BLINKS: u8 = 1;

/// Number of blinks announcing `cause`
pub const fn blink_count(cause: ResetCause) -> u8 {
    if cause.is_watchdog() {
        WATCHDOG_RESET_BLINKS
    } else {
        OTHER_RESET_BLINKS
    }
}

/// Blink `times`, each blink `on_off_ms` on then `on_off_ms` off
pub fn blink<P: OutputPin, D: DelayNs>(
    indicator: &mut Indicator<P>,
    delay: &mut D,
    times: u8,
    on_off_ms: u32,
) {
    for _ in 0..times {
        indicator.on();
        delay.delay_ms(on_off_ms);
        indicator.off();
        delay.delay_ms(on_off_ms);
    }
}

/// Read the reset cause and announce it on the indicator
pub fn indicate_reset_cause<S, P, D>(
    source: &mut S,
    indicator: &mut Indicator<P>,
    delay: &mut D,
    on_off_ms: u32,
) -> ResetCause
where
    S: ResetCauseSource,
    P: OutputPin,
    D: DelayNs,
{
    let cause = source.reset_cause();
    let times = blink_count(cause);
    if cause.is_watchdog() {
        warn!("Reset caused by watchdog expiry");
    } else {
        info!("Reset cause: {}", cause);
    }
    blink(indicator, delay, times, on_off_ms);
    cause
}
