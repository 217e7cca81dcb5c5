//! Low-power sleep

/// Deep-sleep entry
///
/// Implementations own whatever clock context has to survive the sleep
/// (wake-up clock selection, PLL restore, ...).
pub trait DeepSleep {
    /// Halt the CPU until an enabled wake source fires
    fn enter_deep_sleep(&mut self);
}
