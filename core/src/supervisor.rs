//! Supervisory loop
//!
//! The foreground half of the watchdog. In interrupt mode each iteration
//! services a pending expiry, refreshes the ILO compensation and sleeps
//! until the next wake source; in reset mode it runs the monitored task and
//! relies on a hardware reset if that task overruns.
//!
//! All mutable state lives in [`Supervisor`] rather than in globals, so the
//! loop can be driven step by step against simulated hardware.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use hal_abstractions::{DeepSleep, LowAccuracyOscillator, WatchdogCounter, WatchdogInterrupt};

use crate::compensator::ClockCompensator;
use crate::config::SupervisorConfig;
use crate::error::FatalError;
use crate::indicator::Indicator;
use crate::policy::{MatchAnchor, WatchdogPolicy};
use crate::signal::PendingEvent;
use crate::watchdog::WatchdogTimer;

/// Peripherals the supervisor takes ownership of
pub struct Hardware<W, I, O, S> {
    /// Watchdog counter and match comparator
    pub counter: W,
    /// Main-loop handle on the expiry interrupt mask
    pub irq: I,
    /// Oscillator clocking the watchdog
    pub oscillator: O,
    /// Deep-sleep entry
    pub sleep: S,
}

/// Running counters, for logs and tests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorStats {
    pub iterations: u32,
    pub expiries_serviced: u32,
    pub compensation_misses: u32,
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Iteration {
    /// The watchdog was serviced (interrupt: an expiry was handled; reset:
    /// the task completed and the match event was cleared)
    pub serviced: bool,
    /// Freshly compensated tick count, `None` when the cached one was kept
    pub compensated_ticks: Option<u32>,
}

/// Main-loop context of the watchdog
pub struct Supervisor<'a, W, I, O, S, P> {
    config: SupervisorConfig,
    watchdog: WatchdogTimer<W, I>,
    compensator: ClockCompensator<O>,
    sleep: S,
    indicator: Indicator<P>,
    pending: &'a PendingEvent,
    compensated_ticks: u32,
    stats: SupervisorStats,
}

impl<'a, W, I, O, S, P> Supervisor<'a, W, I, O, S, P>
where
    W: WatchdogCounter,
    I: WatchdogInterrupt,
    O: LowAccuracyOscillator,
    S: DeepSleep,
    P: OutputPin,
{
    /// Configure, compensate and arm the watchdog
    ///
    /// In interrupt mode the expiry handler must already be registered with
    /// the interrupt controller: the source is unmasked here.
    pub fn init<D: DelayNs>(
        config: SupervisorConfig,
        hardware: Hardware<W, I, O, S>,
        indicator: Indicator<P>,
        pending: &'a PendingEvent,
        delay: &mut D,
    ) -> Result<Self, FatalError> {
        config.validate()?;

        let Hardware {
            counter,
            irq,
            oscillator,
            sleep,
        } = hardware;
        let mut watchdog = WatchdogTimer::new(counter, irq);
        let mut compensator = ClockCompensator::new(oscillator, config.nominal_hz);
        let mut stats = SupervisorStats::default();
        let desired_us = config.desired_interval_us();

        // Step 1: ignore bits
        watchdog.configure(config.watchdog.ignore_bits)?;

        // Step 2: drop any stale match event
        watchdog.clear_interrupt();
        pending.clear();

        // Step 3: oscillator and first compensation
        compensator.enable(delay, config.ilo_startup_ms);
        compensator.start_measurement();
        let mut compensated_ticks = compensator.nominal_ticks(desired_us);
        match compensator.compensate(desired_us) {
            Ok(interval) => compensated_ticks = interval.ticks,
            Err(e) => {
                stats.compensation_misses += 1;
                warn!(
                    "Initial ILO compensation failed ({}), using nominal {} ticks",
                    e, compensated_ticks
                );
            }
        }

        // Step 4: first match, relative to wherever the counter is now
        let first = watchdog.next_match(compensated_ticks, MatchAnchor::Counter);
        watchdog.set_match(first)?;

        // Step 5: expiry interrupt only in interrupt mode
        if config.policy.installs_handler() {
            watchdog.unmask_interrupt();
        } else {
            watchdog.mask_interrupt();
        }

        // Step 6: go
        watchdog.enable()?;

        info!(
            "WDT armed: {} mode, {} ms = {} ticks, match {}",
            config.policy, config.interval_ms, compensated_ticks, first
        );

        Ok(Self {
            config,
            watchdog,
            compensator,
            sleep,
            indicator,
            pending,
            compensated_ticks,
            stats,
        })
    }

    /// One pass of the loop, ending with a sleep/wake cycle
    ///
    /// `task` is the monitored application work. In interrupt mode it runs
    /// once per serviced expiry; in reset mode it runs every iteration and
    /// must finish before the watchdog window closes.
    pub fn iterate<F>(&mut self, task: F) -> Result<Iteration, FatalError>
    where
        F: FnOnce(&mut Indicator<P>),
    {
        self.stats.iterations = self.stats.iterations.wrapping_add(1);

        let iteration = match self.config.policy {
            WatchdogPolicy::Interrupt => {
                let serviced = self.service_expiry(task)?;
                let compensated_ticks = self.refresh_compensation();
                Iteration {
                    serviced,
                    compensated_ticks,
                }
            }
            WatchdogPolicy::Reset => {
                task(&mut self.indicator);
                self.watchdog.clear_interrupt();
                Iteration {
                    serviced: true,
                    compensated_ticks: None,
                }
            }
        };

        self.sleep_cycle();
        Ok(iteration)
    }

    /// Iterate forever; only returns on a fatal error
    pub fn run<F>(mut self, mut task: F) -> FatalError
    where
        F: FnMut(&mut Indicator<P>),
    {
        loop {
            if let Err(e) = self.iterate(&mut task) {
                error!("Supervision stopped: {}", e);
                return e;
            }
        }
    }

    /// Clear, re-arm and unmask after an expiry, then run the task
    ///
    /// The source stays masked until the new match is installed and the
    /// flag is cleared, so the counter can never hit the stale match and a
    /// new expiry can never be lost between flag clear and unmask.
    fn service_expiry<F>(&mut self, task: F) -> Result<bool, FatalError>
    where
        F: FnOnce(&mut Indicator<P>),
    {
        if !self.pending.is_pending() {
            return Ok(false);
        }

        self.watchdog.clear_interrupt();
        let next = self
            .watchdog
            .rearm(self.compensated_ticks, self.config.match_anchor)?;
        self.pending.clear();
        self.watchdog.unmask_interrupt();

        self.stats.expiries_serviced = self.stats.expiries_serviced.wrapping_add(1);
        debug!("WDT expiry serviced, next match {}", next);

        task(&mut self.indicator);
        Ok(true)
    }

    /// Recompute the tick count; keeps the cached one on failure
    pub fn refresh_compensation(&mut self) -> Option<u32> {
        match self.compensator.compensate(self.config.desired_interval_us()) {
            Ok(interval) => {
                self.compensated_ticks = interval.ticks;
                Some(interval.ticks)
            }
            Err(e) => {
                self.stats.compensation_misses = self.stats.compensation_misses.wrapping_add(1);
                debug!(
                    "ILO compensation skipped ({}), keeping {} ticks",
                    e, self.compensated_ticks
                );
                None
            }
        }
    }

    /// Measurement must never run while deep sleep gates its reference
    fn sleep_cycle(&mut self) {
        self.compensator.stop_measurement();
        self.sleep.enter_deep_sleep();
        self.compensator.start_measurement();
    }

    pub fn policy(&self) -> WatchdogPolicy {
        self.config.policy
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Tick count the next re-arm will use
    pub fn compensated_ticks(&self) -> u32 {
        self.compensated_ticks
    }

    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    pub fn watchdog(&self) -> &WatchdogTimer<W, I> {
        &self.watchdog
    }

    pub fn indicator(&self) -> &Indicator<P> {
        &self.indicator
    }
}
