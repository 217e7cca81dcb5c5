//! Platform-agnostic watchdog supervision with ILO drift compensation
//!
//! This crate contains the watchdog arming/compensation/interrupt state
//! machine. It has NO hardware dependencies: boards plug in through the
//! `hal-abstractions` traits and `embedded-hal` pins/delays.
//!
//! ## Architecture
//! - [`compensator`]: converts a wall-clock interval into a tick count for
//!   the measured (drifted) oscillator frequency
//! - [`watchdog`]: owns the match register, readback checks, re-arming
//! - [`handler`]: the minimal expiry interrupt handler
//! - [`supervisor`]: the main loop that services expiries, refreshes
//!   compensation and sleeps between watchdog cycles
//! - [`startup`]: reset-cause blink pattern shown once at boot

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod compensator;
pub mod config;
pub mod error;
pub mod handler;
pub mod indicator;
pub mod policy;
pub mod signal;
pub mod startup;
pub mod supervisor;
pub mod watchdog;

#[cfg(test)]
mod sim;

pub use hal_abstractions as hal;

pub use compensator::{ClockCompensator, CompensatedInterval};
pub use config::{SupervisorConfig, WatchdogConfig};
pub use error::{CompensationError, ConfigError, FatalError};
pub use handler::ExpiryHandler;
pub use indicator::{Indicator, Polarity};
pub use policy::{MatchAnchor, WatchdogPolicy};
pub use signal::PendingEvent;
pub use supervisor::{Hardware, Iteration, Supervisor, SupervisorStats};
pub use watchdog::{WatchdogState, WatchdogTimer};
