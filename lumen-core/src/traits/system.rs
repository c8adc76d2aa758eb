//! Chip services: stack usage and diagnostics

use crate::tasks::TaskId;

/// Stack high-water mark source
pub trait StackProbe {
    /// Deepest stack usage seen so far for `task`, in bytes
    fn high_water(&self, task: TaskId) -> u32;
}

/// Why the chip last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetCause {
    PowerOn,
    /// Watchdog expired
    Watchdog,
    /// Reset requested by software (e.g. the `reset` command)
    Forced,
    Unknown,
}

impl ResetCause {
    pub fn name(self) -> &'static str {
        match self {
            ResetCause::PowerOn => "power-on",
            ResetCause::Watchdog => "watchdog",
            ResetCause::Forced => "forced",
            ResetCause::Unknown => "unknown",
        }
    }
}

/// Flash and RAM usage in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryUsage {
    pub flash_used: u32,
    pub flash_total: u32,
    pub ram_used: u32,
    pub ram_total: u32,
}

/// Clock frequencies in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockInfo {
    pub system_hz: u32,
    pub peripheral_hz: u32,
}

/// Information captured at boot and shown by `stats`
pub trait Diagnostics {
    fn reset_cause(&self) -> ResetCause;

    /// Resets since power-on
    fn reset_count(&self) -> u32;

    /// Time from reset to the shell prompt, in milliseconds
    fn startup_ms(&self) -> u32;

    fn memory(&self) -> MemoryUsage;

    fn clocks(&self) -> ClockInfo;
}
