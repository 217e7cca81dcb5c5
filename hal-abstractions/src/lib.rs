//! Hardware abstraction traits for the ILO watchdog supervisor
//!
//! This crate defines the traits the supervisor core is written against.
//! BSPs implement them on their watchdog, oscillator and power peripherals;
//! `wdt-core` tests implement them on a simulated device.
//!
//! Indicator pins and delays are not redefined here: they come straight from
//! `embedded-hal` 1.0 (`OutputPin`, `DelayNs`).

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod ilo;
pub mod power;
pub mod reset;
pub mod wdt;

pub use ilo::LowAccuracyOscillator;
pub use power::DeepSleep;
pub use reset::{ResetCause, ResetCauseSource};
pub use wdt::{WatchdogCounter, WatchdogInterrupt};
