//! Stop mode entry
//!
//! Stop keeps SRAM and registers, halts HSI16 and the time driver, and
//! leaves the LSI, LPTIM1 and IWDG running. The core wakes on the LPTIM1
//! match and resumes on HSI16 (STOPWUCK), which is already the system clock,
//! so nothing has to be restored after wake-up.

use cortex_m::asm;
use cortex_m::peripheral::SCB;
use defmt::debug;
use embassy_stm32::pac;
use embassy_stm32::pac::pwr::vals::{Mode, Pdds};
use embassy_stm32::pac::rcc::vals::Stopwuck;
use hal_abstractions::DeepSleep;

pub struct StopMode {
    scb: SCB,
}

impl StopMode {
    pub fn new(scb: SCB) -> Self {
        pac::RCC.apb1enr().modify(|w| w.set_pwren(true));

        // Stop (not Standby), regulator in low-power mode
        pac::PWR.cr().modify(|w| {
            w.set_pdds(Pdds::STOP_MODE);
            w.set_lpsdsr(Mode::LOW_POWER_MODE);
            w.set_cwuf(true);
        });
        pac::RCC.cfgr().modify(|w| w.set_stopwuck(Stopwuck::HSI16));

        // Keep the debug port (and RTT) alive through Stop
        #[cfg(debug_assertions)]
        {
            pac::RCC.apb2enr().modify(|w| w.set_dbgen(true));
            pac::DBGMCU.cr().modify(|w| w.set_dbg_stop(true));
        }

        debug!("Stop mode configured");
        Self { scb }
    }
}

impl DeepSleep for StopMode {
    fn enter_deep_sleep(&mut self) {
        self.scb.set_sleepdeep();
        asm::dsb();
        asm::wfi();
        self.scb.clear_sleepdeep();
    }
}
