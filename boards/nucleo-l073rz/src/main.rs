#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use wdt_core::{FatalError, PendingEvent};

mod lptim_wdt;
mod lsi;
mod nvic;
mod power;
mod reset;

/// Expiry flag shared by the LPTIM1 handler and the supervisory loop
static PENDING: PendingEvent = PendingEvent::new();

/// STM32L0 LSI nominal frequency (26-56 kHz over the operating range)
const LSI_NOMINAL_HZ: u32 = 37_000;

/// RTIC priority of the LPTIM1 task. On the M0+ (2 priority bits) logical
/// priority 4 is NVIC level 0.
const WDT_TASK_PRIORITY: u8 = 4;

const _: () = assert!(
    (1 << embassy_stm32::NVIC_PRIO_BITS) - WDT_TASK_PRIORITY
        == wdt_core::config::WDT_INTERRUPT_PRIORITY,
    "LPTIM1 task priority does not match WDT_INTERRUPT_PRIORITY"
);

/// Unrecoverable: report and stop. In reset mode the IWDG restarts the chip.
fn fatal(e: FatalError) -> ! {
    defmt::error!("Watchdog supervision halted: {}", e);
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::wfi();
    }
}

#[app(device = embassy_stm32, peripherals = false)]
mod app {
    use super::*;
    use defmt::info;
    use embassy_stm32::gpio::{Level, Output, Speed};
    use embassy_stm32::rcc::{LsConfig, RtcClockSource, Sysclk};
    use embassy_stm32::wdg::IndependentWatchdog;
    use embassy_time::Delay;
    use wdt_core::config::WDT_DEMO;
    use wdt_core::{startup, ExpiryHandler, Hardware, Indicator, Polarity, Supervisor, SupervisorConfig};

    use crate::lptim_wdt::LptimWdt;
    use crate::lsi::LsiMeter;
    use crate::nvic::WdtLine;
    use crate::power::StopMode;
    use crate::reset::ResetFlags;

    /// Peripherals handed from `init` to `idle`
    pub struct Board {
        led: Output<'static>,
        counter: LptimWdt,
        oscillator: LsiMeter,
        sleep: StopMode,
        reset: ResetFlags,
    }

    fn supervisor_config() -> SupervisorConfig {
        SupervisorConfig {
            nominal_hz: LSI_NOMINAL_HZ,
            ..SupervisorConfig::new(WDT_DEMO)
        }
    }

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        handler: ExpiryHandler<'static, WdtLine>,
        board: Option<Board>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        info!("ILO watchdog supervisor starting...");

        // NUCLEO-L073RZ: HSI16 system clock, LSI for LPTIM1 and IWDG
        let mut config = embassy_stm32::Config::default();
        config.rcc.hsi = true;
        config.rcc.sys = Sysclk::HSI;
        config.rcc.ls = LsConfig {
            rtc: RtcClockSource::LSI,
            lsi: true,
            lse: None,
        };
        let p = embassy_stm32::init(config);

        // LD2 (green), active high
        let led = Output::new(p.PA5, Level::Low, Speed::Low);

        let supervisor = supervisor_config();
        let backstop = if supervisor.policy.installs_handler() {
            None
        } else {
            // Three unserviced periods, like a cascaded hardware WDT
            let timeout_us = supervisor.desired_interval_us().saturating_mul(3);
            info!("IWDG backstop: {} us", timeout_us);
            Some(IndependentWatchdog::new(p.IWDG, timeout_us))
        };

        let board = Board {
            led,
            counter: LptimWdt::new(backstop),
            oscillator: LsiMeter::new(),
            sleep: StopMode::new(cx.core.SCB),
            reset: ResetFlags,
        };

        (
            Shared {},
            Local {
                handler: ExpiryHandler::new(WdtLine, &PENDING),
                board: Some(board),
            },
        )
    }

    /// Reset-cause blink, then supervision forever
    ///
    /// Runs in idle rather than init: the blink needs the time driver's
    /// interrupts, and interrupt mode needs the LPTIM1 task live.
    #[idle(local = [board])]
    fn idle(cx: idle::Context) -> ! {
        let Some(board) = cx.local.board.take() else {
            fatal(FatalError::BoardInit)
        };
        let Board {
            led,
            counter,
            oscillator,
            sleep,
            mut reset,
        } = board;

        let config = supervisor_config();
        let mut delay = Delay;
        let mut indicator = Indicator::new(led, Polarity::ActiveHigh);
        startup::indicate_reset_cause(&mut reset, &mut indicator, &mut delay, config.blink_delay_ms);

        let hardware = Hardware {
            counter,
            irq: WdtLine,
            oscillator,
            sleep,
        };
        let supervisor = match Supervisor::init(config, hardware, indicator, &PENDING, &mut delay) {
            Ok(supervisor) => supervisor,
            Err(e) => fatal(e),
        };
        info!("Entering supervision loop ({})", supervisor.policy());

        fatal(supervisor.run(|led| led.invert()))
    }

    /// LPTIM1 match: mask and flag, nothing else
    ///
    /// `priority` must equal `WDT_TASK_PRIORITY`.
    #[task(binds = LPTIM1, priority = 4, local = [handler])]
    fn wdt_expiry(cx: wdt_expiry::Context) {
        cx.local.handler.on_expiry();
    }
}
