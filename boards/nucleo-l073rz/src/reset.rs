//! Reset cause from the RCC control/status register

use embassy_stm32::pac;
use embassy_stm32::pac::rcc::regs::Csr;
use hal_abstractions::{ResetCause, ResetCauseSource};

/// Latched RCC reset flags
pub struct ResetFlags;

/// PINRSTF is set alongside every other internal reset, so it is checked last.
fn classify(csr: Csr) -> ResetCause {
    if csr.iwdgrstf() || csr.wwdgrstf() {
        ResetCause::Watchdog
    } else if csr.lpwrrstf() {
        ResetCause::LowPower
    } else if csr.sftrstf() {
        ResetCause::Software
    } else if csr.porrstf() {
        ResetCause::PowerOn
    } else if csr.pinrstf() {
        ResetCause::External
    } else {
        ResetCause::Other
    }
}

impl ResetCauseSource for ResetFlags {
    fn reset_cause(&mut self) -> ResetCause {
        let cause = classify(pac::RCC.csr().read());
        pac::RCC.csr().modify(|w| w.set_rmvf(true));
        cause
    }
}
