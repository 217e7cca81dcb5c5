//! LSI frequency measurement
//!
//! Counts LPTIM1 ticks (LSI-clocked) over a window timed by `embassy-time`,
//! whose time driver runs from HSI16. The time driver stops in Stop mode, so
//! a window must never straddle a sleep: the supervisor stops measuring
//! before sleeping and restarts on wake.

use defmt::trace;
use embassy_stm32::pac;
use embassy_time::{block_for, Duration, Instant};
use hal_abstractions::LowAccuracyOscillator;

use crate::lptim_wdt;

/// Shortest window a reading is taken over
const MEASUREMENT_WINDOW: Duration = Duration::from_millis(10);

/// Fastest LSI the counter wrap has to disambiguate (datasheet max 56 kHz)
const LSI_MAX_HZ: u64 = 64_000;

pub struct LsiMeter {
    window: Option<(Instant, u16)>,
}

impl LsiMeter {
    pub const fn new() -> Self {
        Self { window: None }
    }

    fn restart(&mut self) -> (Instant, u16) {
        let start = (Instant::now(), lptim_wdt::read_counter());
        self.window = Some(start);
        start
    }
}

impl LowAccuracyOscillator for LsiMeter {
    fn enable(&mut self) {
        pac::RCC.csr().modify(|w| w.set_lsion(true));
        while !pac::RCC.csr().read().lsirdy() {}
    }

    fn start_measurement(&mut self) {
        self.restart();
    }

    fn stop_measurement(&mut self) {
        self.window = None;
    }

    fn measured_hz(&mut self) -> Option<u32> {
        let (mut start, mut start_count) = self.window?;

        let period = lptim_wdt::counter_period();
        let unambiguous = Duration::from_micros(u64::from(period) * 1_000_000 / LSI_MAX_HZ);
        if unambiguous < MEASUREMENT_WINDOW {
            // Too many ignore bits: the counter wraps within one window
            return None;
        }
        if start.elapsed() >= unambiguous {
            (start, start_count) = self.restart();
        }
        let elapsed = start.elapsed();
        if elapsed < MEASUREMENT_WINDOW {
            block_for(MEASUREMENT_WINDOW - elapsed);
        }

        let now = Instant::now();
        let count = lptim_wdt::read_counter();
        self.window = Some((now, count));

        let ticks = (u32::from(count) + period - u32::from(start_count)) % period;
        let micros = (now - start).as_micros();
        if micros == 0 {
            return None;
        }
        let hz = (u64::from(ticks) * 1_000_000 / micros) as u32;
        trace!("LSI: {} ticks in {} us = {} Hz", ticks, micros, hz);
        Some(hz)
    }
}
