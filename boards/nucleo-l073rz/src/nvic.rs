//! NVIC Mask Control for the Watchdog Line
//!
//! This module is the **ONLY** place in the board crate that calls into
//! `unsafe` NVIC APIs. LPTIM1 only accepts IER writes while the timer is
//! disabled, and the counter must keep running, so the expiry interrupt is
//! masked at the NVIC instead of at the peripheral.
//!
//! # Safety Requirements
//!
//! Unmasking an interrupt can break critical sections that rely on it being
//! masked. The LPTIM1 task shares no resources with other tasks (its only
//! state is a task-local handler and the atomic pending flag), so no RTIC
//! lock depends on this line.
#![allow(unsafe_code)]

use cortex_m::peripheral::NVIC;
use embassy_stm32::pac::Interrupt;
use hal_abstractions::WatchdogInterrupt;

const LINE: Interrupt = Interrupt::LPTIM1;

/// Handle on the LPTIM1 interrupt mask
///
/// Zero-sized: the interrupt handler and the main loop each own one.
#[derive(Debug, Clone, Copy, Default)]
pub struct WdtLine;

impl WatchdogInterrupt for WdtLine {
    fn mask(&mut self) {
        NVIC::mask(LINE);
    }

    fn unmask(&mut self) {
        // Drop the latch left by the serviced match. The line is
        // level-sensitive, so a live CMPM re-pends immediately.
        NVIC::unpend(LINE);
        // SAFETY: see module docs; no critical section relies on this line.
        unsafe { NVIC::unmask(LINE) }
    }

    fn is_masked(&self) -> bool {
        !NVIC::is_enabled(LINE)
    }
}
