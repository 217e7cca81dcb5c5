//! Watchdog timer core
//!
//! Wraps the hardware counter/match comparator with the integrity checks a
//! supervisory watchdog needs: every configuration write is read back, and a
//! mismatch is a [`FatalError`].
//!
//! ## Interrupt-mode state machine
//! ```text
//! ARMED --count == match--> FIRED (interrupt raised, handler masks it)
//!   ^                          |
//!   +---- SERVICED <-----------+
//!         (loop clears status, re-arms match, unmasks)
//! ```
//! In reset mode an unserviced match restarts the device instead.

use hal_abstractions::{WatchdogCounter, WatchdogInterrupt};

use crate::config::{window_ticks, MAX_IGNORE_BITS};
use crate::error::{ConfigError, FatalError};
use crate::policy::MatchAnchor;

/// Snapshot of the watchdog registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogState {
    pub current_count: u16,
    pub match_value: u16,
    pub enabled: bool,
    pub interrupt_masked: bool,
}

/// Owner of the watchdog counter and its interrupt mask
pub struct WatchdogTimer<W, I> {
    counter: W,
    irq: I,
    ignore_bits: u8,
}

impl<W: WatchdogCounter, I: WatchdogInterrupt> WatchdogTimer<W, I> {
    pub fn new(counter: W, irq: I) -> Self {
        Self {
            counter,
            irq,
            ignore_bits: 0,
        }
    }

    /// Set the ignore-bit count, verifying the hardware latched it
    pub fn configure(&mut self, ignore_bits: u8) -> Result<(), FatalError> {
        if ignore_bits > MAX_IGNORE_BITS {
            return Err(ConfigError::IgnoreBitsOutOfRange { bits: ignore_bits }.into());
        }

        self.counter.set_ignore_bits(ignore_bits);
        let actual = self.counter.ignore_bits();
        if actual != ignore_bits {
            error!("WDT ignore bits readback: wrote {}, read {}", ignore_bits, actual);
            return Err(FatalError::IgnoreBitsReadback {
                requested: ignore_bits,
                actual,
            });
        }

        self.ignore_bits = ignore_bits;
        Ok(())
    }

    pub fn ignore_bits(&self) -> u8 {
        self.ignore_bits
    }

    /// Counter bits the comparator looks at
    pub fn counter_mask(&self) -> u16 {
        u16::MAX >> self.ignore_bits
    }

    /// Ticks before the compared part of the counter wraps
    pub fn window_ticks(&self) -> u32 {
        window_ticks(self.ignore_bits)
    }

    /// Write the match threshold, verifying the readback
    pub fn set_match(&mut self, value: u16) -> Result<(), FatalError> {
        self.counter.set_match(value);
        let read = self.counter.match_value();
        if read != value {
            error!("WDT match readback: wrote {=u16:#x}, read {=u16:#x}", value, read);
            return Err(FatalError::MatchReadback {
                written: value,
                read,
            });
        }
        Ok(())
    }

    pub fn match_value(&self) -> u16 {
        self.counter.match_value()
    }

    pub fn counter(&self) -> u16 {
        self.counter.counter()
    }

    /// Activate the watchdog and confirm it is running
    pub fn enable(&mut self) -> Result<(), FatalError> {
        self.counter.enable();
        if !self.counter.is_enabled() {
            error!("WDT did not report enabled");
            return Err(FatalError::EnableReadback);
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.counter.is_enabled()
    }

    pub fn clear_interrupt(&mut self) {
        self.counter.clear_interrupt();
    }

    /// Whether a match event is latched
    pub fn interrupt_pending(&self) -> bool {
        self.counter.interrupt_status()
    }

    pub fn mask_interrupt(&mut self) {
        self.irq.mask();
    }

    pub fn unmask_interrupt(&mut self) {
        self.irq.unmask();
    }

    pub fn is_interrupt_masked(&self) -> bool {
        self.irq.is_masked()
    }

    /// Match value `ticks` after the chosen anchor, wrapped to the counter
    /// width
    ///
    /// `ticks` is expected to be below [`window_ticks`](Self::window_ticks);
    /// larger counts alias onto a shorter period.
    pub fn next_match(&self, ticks: u32, anchor: MatchAnchor) -> u16 {
        let mask = self.counter_mask();
        let count = self.counter.counter() & mask;
        let step = (ticks & u32::from(mask)) as u16;

        let base = match anchor {
            MatchAnchor::Counter => count,
            MatchAnchor::LastMatch => {
                let last = self.counter.match_value() & mask;
                let since_last = count.wrapping_sub(last) & mask;
                if u32::from(since_last) >= ticks {
                    // Servicing overran the whole period; re-base so the
                    // next match is not a full counter wrap away.
                    count
                } else {
                    last
                }
            }
        };

        base.wrapping_add(step) & mask
    }

    /// Install the next match threshold
    pub fn rearm(&mut self, ticks: u32, anchor: MatchAnchor) -> Result<u16, FatalError> {
        if ticks >= self.window_ticks() {
            warn!(
                "{} ticks exceed the {}-tick WDT window",
                ticks,
                self.window_ticks()
            );
        }
        let next = self.next_match(ticks, anchor);
        self.set_match(next)?;
        Ok(next)
    }

    pub fn state(&self) -> WatchdogState {
        WatchdogState {
            current_count: self.counter.counter(),
            match_value: self.counter.match_value(),
            enabled: self.counter.is_enabled(),
            interrupt_masked: self.irq.is_masked(),
        }
    }
}
