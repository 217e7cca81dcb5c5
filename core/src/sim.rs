//! Simulated device for host tests
//!
//! Every peripheral handle shares one `RefCell<SimState>`, so a test can
//! inspect or poke the "registers" between calls. Deep sleep fast-forwards
//! the counter to the next match and dispatches the expiry handler the way
//! the interrupt controller would.

#![allow(dead_code)]

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use hal_abstractions::{DeepSleep, LowAccuracyOscillator, WatchdogCounter, WatchdogInterrupt};

use crate::handler::ExpiryHandler;
use crate::signal::PendingEvent;

#[derive(Debug)]
pub struct SimState {
    // Watchdog registers
    pub counter: u16,
    pub match_value: u16,
    pub ignore_bits: u8,
    pub enabled: bool,
    pub status: bool,
    pub masked: bool,
    pub mask_count: u32,
    pub unmask_count: u32,

    // Fault injection
    pub stuck_ignore_bits: Option<u8>,
    pub stuck_match: Option<u16>,
    pub enable_fault: bool,

    // Oscillator
    pub osc_enabled: bool,
    pub measuring: bool,
    /// Frequency the measurement reports; `None` = not settled
    pub osc_hz: Option<u32>,
    pub measurement_starts: u32,

    // Sleep and interrupt bookkeeping
    pub sleeps: u32,
    pub slept_while_measuring: bool,
    /// Ticks between wake-up and the loop reaching the service code
    pub service_latency_ticks: u16,
    pub expiries_dispatched: u32,
    pub expiries_suppressed: u32,
    pub dispatched_while_pending: u32,
    pub unmasked_while_pending: u32,
    pub double_services: u32,
}

impl SimState {
    pub fn new() -> Self {
        Self {
            counter: 0,
            match_value: 0,
            ignore_bits: 0,
            enabled: false,
            status: false,
            masked: true,
            mask_count: 0,
            unmask_count: 0,
            stuck_ignore_bits: None,
            stuck_match: None,
            enable_fault: false,
            osc_enabled: false,
            measuring: false,
            osc_hz: None,
            measurement_starts: 0,
            sleeps: 0,
            slept_while_measuring: false,
            service_latency_ticks: 0,
            expiries_dispatched: 0,
            expiries_suppressed: 0,
            dispatched_while_pending: 0,
            unmasked_while_pending: 0,
            double_services: 0,
        }
    }

    fn mask(&self) -> u16 {
        u16::MAX >> self.ignore_bits
    }

    /// Ticks until the compared counter bits equal the match value
    pub fn ticks_to_match(&self) -> u32 {
        let mask = self.mask();
        let distance = self.match_value.wrapping_sub(self.counter) & mask;
        if distance == 0 {
            u32::from(mask) + 1
        } else {
            u32::from(distance)
        }
    }

    /// Run the counter forward, latching the match event if it is crossed
    pub fn advance(&mut self, ticks: u32) -> bool {
        let hit = self.enabled && ticks >= self.ticks_to_match();
        self.counter = (u32::from(self.counter) + ticks) as u16;
        if hit {
            self.status = true;
        }
        hit
    }
}

pub struct SimCounter<'a> {
    state: &'a RefCell<SimState>,
}

impl<'a> SimCounter<'a> {
    pub fn new(state: &'a RefCell<SimState>) -> Self {
        Self { state }
    }
}

impl WatchdogCounter for SimCounter<'_> {
    fn set_ignore_bits(&mut self, bits: u8) {
        self.state.borrow_mut().ignore_bits = bits;
    }

    fn ignore_bits(&self) -> u8 {
        let s = self.state.borrow();
        s.stuck_ignore_bits.unwrap_or(s.ignore_bits)
    }

    fn set_match(&mut self, value: u16) {
        self.state.borrow_mut().match_value = value;
    }

    fn match_value(&self) -> u16 {
        let s = self.state.borrow();
        s.stuck_match.unwrap_or(s.match_value)
    }

    fn counter(&self) -> u16 {
        self.state.borrow().counter
    }

    fn enable(&mut self) {
        let mut s = self.state.borrow_mut();
        if !s.enable_fault {
            s.enabled = true;
        }
    }

    fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    fn clear_interrupt(&mut self) {
        self.state.borrow_mut().status = false;
    }

    fn interrupt_status(&self) -> bool {
        self.state.borrow().status
    }
}

pub struct SimIrq<'a> {
    state: &'a RefCell<SimState>,
    pending: &'a PendingEvent,
}

impl<'a> SimIrq<'a> {
    pub fn new(state: &'a RefCell<SimState>, pending: &'a PendingEvent) -> Self {
        Self { state, pending }
    }
}

impl WatchdogInterrupt for SimIrq<'_> {
    fn mask(&mut self) {
        let mut s = self.state.borrow_mut();
        s.masked = true;
        s.mask_count += 1;
    }

    fn unmask(&mut self) {
        let mut s = self.state.borrow_mut();
        if self.pending.is_pending() {
            s.unmasked_while_pending += 1;
        }
        if !s.masked {
            // Already live: serviced without a fresh expiry
            s.double_services += 1;
        }
        s.masked = false;
        s.unmask_count += 1;
    }

    fn is_masked(&self) -> bool {
        self.state.borrow().masked
    }
}

pub struct SimOscillator<'a> {
    state: &'a RefCell<SimState>,
}

impl<'a> SimOscillator<'a> {
    pub fn new(state: &'a RefCell<SimState>) -> Self {
        Self { state }
    }
}

impl LowAccuracyOscillator for SimOscillator<'_> {
    fn enable(&mut self) {
        self.state.borrow_mut().osc_enabled = true;
    }

    fn start_measurement(&mut self) {
        let mut s = self.state.borrow_mut();
        s.measuring = true;
        s.measurement_starts += 1;
    }

    fn stop_measurement(&mut self) {
        self.state.borrow_mut().measuring = false;
    }

    fn measured_hz(&mut self) -> Option<u32> {
        let s = self.state.borrow();
        if s.measuring {
            s.osc_hz
        } else {
            None
        }
    }
}

/// Deep sleep that wakes on the next watchdog match
pub struct SimSleep<'a> {
    state: &'a RefCell<SimState>,
    pending: &'a PendingEvent,
    handler: Option<ExpiryHandler<'a, SimIrq<'a>>>,
}

impl<'a> SimSleep<'a> {
    pub fn new(
        state: &'a RefCell<SimState>,
        pending: &'a PendingEvent,
        handler: Option<ExpiryHandler<'a, SimIrq<'a>>>,
    ) -> Self {
        Self {
            state,
            pending,
            handler,
        }
    }
}

impl DeepSleep for SimSleep<'_> {
    fn enter_deep_sleep(&mut self) {
        let dispatch = {
            let mut s = self.state.borrow_mut();
            s.sleeps += 1;
            if s.measuring {
                s.slept_while_measuring = true;
            }
            let ticks = s.ticks_to_match();
            if !s.advance(ticks) {
                return;
            }
            if self.handler.is_some() && !s.masked {
                if self.pending.is_pending() {
                    s.dispatched_while_pending += 1;
                }
                s.expiries_dispatched += 1;
                true
            } else {
                s.expiries_suppressed += 1;
                false
            }
        };

        if dispatch {
            if let Some(handler) = self.handler.as_mut() {
                handler.on_expiry();
            }
        }

        let mut s = self.state.borrow_mut();
        let latency = u32::from(s.service_latency_ticks);
        s.advance(latency);
    }
}

/// Delay that only records how long it was asked to wait
#[derive(Debug, Default)]
pub struct SimDelay {
    total_ns: u64,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Output pin counting level changes
#[derive(Debug, Default)]
pub struct SimPin {
    pub high: bool,
    pub rising_edges: u32,
    pub falling_edges: u32,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            self.falling_edges += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.rising_edges += 1;
        }
        self.high = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_latches_match() {
        let mut s = SimState::new();
        s.enabled = true;
        s.match_value = 100;
        assert!(!s.advance(99));
        assert!(!s.status);
        assert!(s.advance(1));
        assert!(s.status);
        assert_eq!(s.counter, 100);
        // Sitting on the match means a full wrap to the next hit
        assert_eq!(s.ticks_to_match(), 65_536);
    }
}
