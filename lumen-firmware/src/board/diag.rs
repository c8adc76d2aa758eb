//! Chip diagnostics for the `stats` command

use core::ptr;

use embassy_rp::watchdog::{ResetReason, Watchdog};
use embassy_time::Instant;
use lumen_core::traits::{ClockInfo, Diagnostics, MemoryUsage, ResetCause};

use super::{FLASH_BASE, FLASH_SIZE, RAM_BASE};

/// Scratch registers survive every reset except power-on
const SCRATCH_MAGIC: usize = 0;
const SCRATCH_COUNT: usize = 1;
const MAGIC: u32 = 0x4C55_4D45;

extern "C" {
    static __sidata: u32;
    static __sdata: u32;
    static __edata: u32;
    static __sheap: u32;
    static _stack_start: u32;
}

fn symbol(addr: *const u32) -> u32 {
    addr as u32
}

/// Values captured once the shell is up
pub struct BoardDiagnostics {
    reset_cause: ResetCause,
    reset_count: u32,
    startup_ms: u32,
}

impl BoardDiagnostics {
    /// Read the reset cause and bump the reset counter kept in the
    /// watchdog scratch registers
    pub fn capture(watchdog: &mut Watchdog, started: Instant) -> Self {
        let reset_cause = match watchdog.reset_reason() {
            None => ResetCause::PowerOn,
            Some(ResetReason::TimedOut) => ResetCause::Watchdog,
            Some(ResetReason::Forced) => ResetCause::Forced,
        };

        let previous = if watchdog.get_scratch(SCRATCH_MAGIC) == MAGIC {
            watchdog.get_scratch(SCRATCH_COUNT)
        } else {
            0
        };
        let reset_count = match reset_cause {
            ResetCause::PowerOn => 0,
            _ => previous.wrapping_add(1),
        };
        watchdog.set_scratch(SCRATCH_MAGIC, MAGIC);
        watchdog.set_scratch(SCRATCH_COUNT, reset_count);

        Self {
            reset_cause,
            reset_count,
            startup_ms: started.as_millis() as u32,
        }
    }
}

impl Diagnostics for BoardDiagnostics {
    fn reset_cause(&self) -> ResetCause {
        self.reset_cause
    }

    fn reset_count(&self) -> u32 {
        self.reset_count
    }

    fn startup_ms(&self) -> u32 {
        self.startup_ms
    }

    fn memory(&self) -> MemoryUsage {
        #[allow(unused_unsafe)]
        let (sidata, sdata, edata, sheap, stack_start) = unsafe {
            (
                symbol(ptr::addr_of!(__sidata)),
                symbol(ptr::addr_of!(__sdata)),
                symbol(ptr::addr_of!(__edata)),
                symbol(ptr::addr_of!(__sheap)),
                symbol(ptr::addr_of!(_stack_start)),
            )
        };

        MemoryUsage {
            // Code and constants end where the .data image starts
            flash_used: (sidata + edata.saturating_sub(sdata)).saturating_sub(FLASH_BASE),
            flash_total: FLASH_SIZE as u32,
            ram_used: sheap.saturating_sub(RAM_BASE),
            ram_total: stack_start.saturating_sub(RAM_BASE),
        }
    }

    fn clocks(&self) -> ClockInfo {
        ClockInfo {
            system_hz: embassy_rp::clocks::clk_sys_freq(),
            peripheral_hz: embassy_rp::clocks::clk_peri_freq(),
        }
    }
}
