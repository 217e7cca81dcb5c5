//! LPTIM1 as the ILO-clocked watchdog counter
//!
//! The STM32L0 has no match-based watchdog, so LPTIM1 stands in for one:
//! it is clocked by the LSI, runs in Stop mode and wakes the core through
//! EXTI line 29 (enabled out of reset). The comparator ignores the top
//! counter bits by shrinking the auto-reload value to `0xFFFF >> bits`, so
//! the counter wraps at the compared width.
//!
//! The counter free-runs from construction so the LSI can be measured
//! before the watchdog is armed. Arming in reset mode also unleashes the
//! IWDG as the hardware reset backstop; the main loop pets it every time it
//! clears the match event.

use defmt::debug;
use embassy_stm32::pac;
use embassy_stm32::pac::rcc::vals::Lptimsel;
use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use hal_abstractions::WatchdogCounter;

/// Hardware reset backstop used in reset mode
pub type Backstop = IndependentWatchdog<'static, IWDG>;

/// Current counter value
///
/// CNT is clocked asynchronously to the bus, so it is read until two
/// consecutive reads agree.
pub fn read_counter() -> u16 {
    let mut last = pac::LPTIM1.cnt().read().cnt();
    loop {
        let now = pac::LPTIM1.cnt().read().cnt();
        if now == last {
            return now;
        }
        last = now;
    }
}

/// Number of counter values before the counter wraps
pub fn counter_period() -> u32 {
    u32::from(pac::LPTIM1.arr().read().arr()) + 1
}

pub struct LptimWdt {
    armed: bool,
    backstop: Option<Backstop>,
}

impl LptimWdt {
    /// Clock LPTIM1 from the LSI and start it free-running
    ///
    /// The LSI must already be running.
    pub fn new(backstop: Option<Backstop>) -> Self {
        pac::RCC.ccipr().modify(|w| w.set_lptim1sel(Lptimsel::LSI));
        pac::RCC.apb1enr().modify(|w| w.set_lptim1en(true));

        // CFGR and IER are only writable while disabled. CFGR reset value:
        // internal clock, no prescaler, software start.
        pac::LPTIM1.cr().write(|w| w.set_enable(false));
        pac::LPTIM1.cfgr().write(|_| {});
        pac::LPTIM1.ier().write(|w| w.set_cmpmie(true));

        pac::LPTIM1.cr().write(|w| w.set_enable(true));
        pac::LPTIM1.arr().write(|w| w.set_arr(u16::MAX));
        wait_arr_ok();
        pac::LPTIM1.cr().write(|w| {
            w.set_enable(true);
            w.set_cntstrt(true);
        });

        debug!("LPTIM1 running from LSI");
        Self {
            armed: false,
            backstop,
        }
    }
}

/// Wait for an ARR write to cross into the LSI domain
fn wait_arr_ok() {
    while !pac::LPTIM1.isr().read().arrok() {}
    pac::LPTIM1.icr().write(|w| {
        w.set_arrokcf(true);
        w.set_arrmcf(true);
    });
}

/// Wait for a CMP write to cross into the LSI domain
fn wait_cmp_ok() {
    while !pac::LPTIM1.isr().read().cmpok() {}
    pac::LPTIM1.icr().write(|w| w.set_cmpokcf(true));
}

impl WatchdogCounter for LptimWdt {
    fn set_ignore_bits(&mut self, bits: u8) {
        let arr = u16::MAX >> bits.min(15);
        pac::LPTIM1.arr().write(|w| w.set_arr(arr));
        wait_arr_ok();
    }

    fn ignore_bits(&self) -> u8 {
        pac::LPTIM1.arr().read().arr().leading_zeros() as u8
    }

    fn set_match(&mut self, value: u16) {
        pac::LPTIM1.cmp().write(|w| w.set_cmp(value));
        wait_cmp_ok();
    }

    fn match_value(&self) -> u16 {
        pac::LPTIM1.cmp().read().cmp()
    }

    fn counter(&self) -> u16 {
        read_counter()
    }

    fn enable(&mut self) {
        if let Some(iwdg) = self.backstop.as_mut() {
            iwdg.unleash();
        }
        self.armed = true;
    }

    fn is_enabled(&self) -> bool {
        self.armed && pac::LPTIM1.cr().read().enable()
    }

    fn clear_interrupt(&mut self) {
        pac::LPTIM1.icr().write(|w| w.set_cmpmcf(true));
        if let Some(iwdg) = self.backstop.as_mut() {
            iwdg.pet();
        }
    }

    fn interrupt_status(&self) -> bool {
        pac::LPTIM1.isr().read().cmpm()
    }
}
