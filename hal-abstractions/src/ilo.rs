//! Internal low-accuracy oscillator (ILO)
//!
//! The ILO clocks the watchdog counter. Its frequency is only loosely
//! specified (typically nominal ±60 %) and drifts with temperature and
//! voltage, so implementations measure it against an accurate reference
//! clock. That reference clock is usually gated in deep sleep, which is why
//! measurement has explicit start/stop calls.

/// Oscillator with a reference-clock frequency measurement
pub trait LowAccuracyOscillator {
    /// Turn the oscillator on
    ///
    /// Callers wait a start-up settling delay before measuring.
    fn enable(&mut self);

    /// Begin measuring the oscillator against the reference clock
    fn start_measurement(&mut self);

    /// Halt the measurement
    ///
    /// Must be called before entering deep sleep.
    fn stop_measurement(&mut self);

    /// Latest measured frequency in Hz
    ///
    /// Returns `None` while the measurement is not running or has not
    /// produced a stable result yet.
    fn measured_hz(&mut self) -> Option<u32>;
}
