//! ILO clock compensation
//!
//! The watchdog counts ticks of an oscillator that is only specified to
//! within ±60 % of nominal and drifts with temperature and voltage. The
//! compensator measures the real frequency against a reference clock and
//! converts a desired interval into the tick count that actually lasts that
//! long. Compensation is re-run every supervision cycle, not once at boot.

use embedded_hal::delay::DelayNs;
use hal_abstractions::LowAccuracyOscillator;

use crate::config::ILO_ACCURACY_PERCENT;
use crate::error::CompensationError;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Tick count lasting `desired_us` at `hz`, rounded to the nearest tick
pub fn ticks_for_interval(desired_us: u32, hz: u32) -> u32 {
    let ticks = (desired_us as u64 * hz as u64 + MICROS_PER_SEC / 2) / MICROS_PER_SEC;
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Inclusive frequency band `nominal ± percent`
pub const fn accuracy_band(nominal_hz: u32, percent: u32) -> (u32, u32) {
    let span = (nominal_hz as u64 * percent as u64 / 100) as u32;
    (
        nominal_hz.saturating_sub(span),
        nominal_hz.saturating_add(span),
    )
}

/// A desired interval expressed in ticks of the measured oscillator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedInterval {
    pub desired_us: u32,
    pub ticks: u32,
    pub measured_hz: u32,
}

/// Converts wall-clock intervals into oscillator ticks
pub struct ClockCompensator<O> {
    oscillator: O,
    nominal_hz: u32,
    band: (u32, u32),
    measuring: bool,
}

impl<O: LowAccuracyOscillator> ClockCompensator<O> {
    pub fn new(oscillator: O, nominal_hz: u32) -> Self {
        Self {
            oscillator,
            nominal_hz,
            band: accuracy_band(nominal_hz, ILO_ACCURACY_PERCENT),
            measuring: false,
        }
    }

    /// Turn the oscillator on and wait for it to settle
    pub fn enable<D: DelayNs>(&mut self, delay: &mut D, startup_ms: u32) {
        self.oscillator.enable();
        delay.delay_ms(startup_ms);
    }

    /// Begin measuring against the reference clock
    pub fn start_measurement(&mut self) {
        if !self.measuring {
            self.oscillator.start_measurement();
            self.measuring = true;
        }
    }

    /// Halt measurement; required before deep sleep gates the reference
    pub fn stop_measurement(&mut self) {
        if self.measuring {
            self.oscillator.stop_measurement();
            self.measuring = false;
        }
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn nominal_hz(&self) -> u32 {
        self.nominal_hz
    }

    /// Tick count for `desired_us` assuming the oscillator runs at nominal
    pub fn nominal_ticks(&self, desired_us: u32) -> u32 {
        ticks_for_interval(desired_us, self.nominal_hz)
    }

    /// Tick count for `desired_us` at the currently measured frequency
    ///
    /// Does not clamp: `desired_us` fitting the watchdog counter window is
    /// the caller's precondition.
    pub fn compensate(&mut self, desired_us: u32) -> Result<CompensatedInterval, CompensationError> {
        if !self.measuring {
            return Err(CompensationError::NotMeasuring);
        }
        let measured_hz = self
            .oscillator
            .measured_hz()
            .ok_or(CompensationError::NotSettled)?;

        let (low, high) = self.band;
        if measured_hz < low || measured_hz > high {
            warn!(
                "ILO reading {} Hz outside {}..={} Hz",
                measured_hz, low, high
            );
            return Err(CompensationError::Implausible { measured_hz });
        }

        let ticks = ticks_for_interval(desired_us, measured_hz);
        trace!("ILO {} Hz: {} us -> {} ticks", measured_hz, desired_us, ticks);
        Ok(CompensatedInterval {
            desired_us,
            ticks,
            measured_hz,
        })
    }

    pub fn oscillator(&self) -> &O {
        &self.oscillator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ILO_FREQUENCY_HZ, WDT_INTERRUPT_INTERVAL_MS};
    use crate::sim::{SimDelay, SimOscillator, SimState};
    use core::cell::RefCell;

    const ONE_SECOND_US: u32 = WDT_INTERRUPT_INTERVAL_MS * 1000;

    #[test]
    fn test_nominal_conversion() {
        assert_eq!(ticks_for_interval(ONE_SECOND_US, ILO_FREQUENCY_HZ), 40_000);
        assert_eq!(ticks_for_interval(0, ILO_FREQUENCY_HZ), 0);
        // 25 us per tick at 40 kHz, rounded to nearest
        assert_eq!(ticks_for_interval(37, ILO_FREQUENCY_HZ), 1);
        assert_eq!(ticks_for_interval(38, ILO_FREQUENCY_HZ), 2);
        assert_eq!(ticks_for_interval(12, ILO_FREQUENCY_HZ), 0);
    }

    #[test]
    fn test_accuracy_band() {
        assert_eq!(accuracy_band(40_000, 60), (16_000, 64_000));
        assert_eq!(accuracy_band(40_000, 0), (40_000, 40_000));
        assert_eq!(accuracy_band(10, 200), (0, 30));
    }

    #[test]
    fn test_slow_oscillator_needs_fewer_ticks() {
        let state = RefCell::new(SimState::new());
        state.borrow_mut().osc_hz = Some(38_000);
        let mut comp = ClockCompensator::new(SimOscillator::new(&state), ILO_FREQUENCY_HZ);
        comp.start_measurement();

        let interval = comp.compensate(ONE_SECOND_US).unwrap();
        // One real second is only 38000 ticks of a 5 % slow ILO; the naive
        // 40000 ticks would stretch the period to ~1053 ms.
        assert_eq!(interval.ticks, 38_000);
        assert!(interval.ticks < comp.nominal_ticks(ONE_SECOND_US));
        assert_eq!(interval.measured_hz, 38_000);
    }

    #[test]
    fn test_fast_oscillator_needs_more_ticks() {
        let state = RefCell::new(SimState::new());
        state.borrow_mut().osc_hz = Some(42_105);
        let mut comp = ClockCompensator::new(SimOscillator::new(&state), ILO_FREQUENCY_HZ);
        comp.start_measurement();

        let interval = comp.compensate(ONE_SECOND_US).unwrap();
        assert_eq!(interval.ticks, 42_105);
        assert!(interval.ticks > comp.nominal_ticks(ONE_SECOND_US));
    }

    #[test]
    fn test_ticks_approximate_desired_interval() {
        let state = RefCell::new(SimState::new());
        let mut comp = ClockCompensator::new(SimOscillator::new(&state), ILO_FREQUENCY_HZ);
        comp.start_measurement();

        for &hz in &[16_000u32, 31_337, 40_000, 47_500, 64_000] {
            state.borrow_mut().osc_hz = Some(hz);
            for &desired_us in &[1_000u32, 250_000, 1_000_000, 1_600_000] {
                let ticks = comp.compensate(desired_us).unwrap().ticks;
                let actual_us = ticks as u64 * 1_000_000 / hz as u64;
                let error_us = actual_us.abs_diff(desired_us as u64);
                // Within one tick period
                assert!(
                    error_us <= 1_000_000 / hz as u64 + 1,
                    "{} us at {} Hz gave {} ticks ({} us)",
                    desired_us,
                    hz,
                    ticks,
                    actual_us
                );
            }
        }
    }

    #[test]
    fn test_compensation_is_idempotent() {
        let state = RefCell::new(SimState::new());
        state.borrow_mut().osc_hz = Some(33_333);
        let mut comp = ClockCompensator::new(SimOscillator::new(&state), ILO_FREQUENCY_HZ);
        comp.start_measurement();

        let first = comp.compensate(ONE_SECOND_US).unwrap();
        for _ in 0..10 {
            assert_eq!(comp.compensate(ONE_SECOND_US).unwrap(), first);
        }
    }

    #[test]
    fn test_failure_statuses() {
        let state = RefCell::new(SimState::new());
        let mut comp = ClockCompensator::new(SimOscillator::new(&state), ILO_FREQUENCY_HZ);

        state.borrow_mut().osc_hz = Some(40_000);
        assert_eq!(
            comp.compensate(ONE_SECOND_US),
            Err(CompensationError::NotMeasuring)
        );

        comp.start_measurement();
        state.borrow_mut().osc_hz = None;
        assert_eq!(
            comp.compensate(ONE_SECOND_US),
            Err(CompensationError::NotSettled)
        );

        state.borrow_mut().osc_hz = Some(10_000);
        assert_eq!(
            comp.compensate(ONE_SECOND_US),
            Err(CompensationError::Implausible { measured_hz: 10_000 })
        );

        state.borrow_mut().osc_hz = Some(70_000);
        assert!(matches!(
            comp.compensate(ONE_SECOND_US),
            Err(CompensationError::Implausible { .. })
        ));
    }

    #[test]
    fn test_measurement_lifecycle() {
        let state = RefCell::new(SimState::new());
        let mut comp = ClockCompensator::new(SimOscillator::new(&state), ILO_FREQUENCY_HZ);
        let mut delay = SimDelay::new();

        comp.enable(&mut delay, 2);
        assert!(state.borrow().osc_enabled);
        assert_eq!(delay.total_ms(), 2);

        comp.start_measurement();
        comp.start_measurement();
        assert!(comp.is_measuring());
        assert_eq!(state.borrow().measurement_starts, 1);

        comp.stop_measurement();
        assert!(!comp.is_measuring());
        assert!(!state.borrow().measuring);
    }
}
