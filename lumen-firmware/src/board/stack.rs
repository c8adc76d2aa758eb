//! Painted-stack high-water measurement
//!
//! Embassy tasks keep their state in statics and all run on the one main
//! stack, so usage is measured for that stack as a whole. At boot the free
//! region between the end of static RAM and the current stack pointer is
//! filled with a pattern; the deepest overwritten word marks the high
//! water.

use core::ptr;

use lumen_core::tasks::TaskId;
use lumen_core::traits::StackProbe;
use portable_atomic::{AtomicU32, Ordering};

const PAINT: u32 = 0x5A5A_A5A5;

/// Headroom below the live stack pointer left unpainted
const PAINT_MARGIN: u32 = 256;

/// Painted words in a row that end a scan
const CLEAN_RUN: u32 = 16;

extern "C" {
    static __sheap: u32;
    static _stack_start: u32;
}

fn stack_bottom() -> u32 {
    #[allow(unused_unsafe)]
    unsafe {
        ptr::addr_of!(__sheap) as u32
    }
}

fn stack_top() -> u32 {
    #[allow(unused_unsafe)]
    unsafe {
        ptr::addr_of!(_stack_start) as u32
    }
}

/// Lowest address known to have been used
static WATERMARK: AtomicU32 = AtomicU32::new(0);

/// Fill the unused stack with the paint pattern
///
/// Call once, first thing in `main`.
pub fn paint() {
    let bottom = (stack_bottom() + 3) & !3;
    let limit = cortex_m::register::msp::read().saturating_sub(PAINT_MARGIN) & !3;

    let mut addr = bottom;
    while addr < limit {
        // SAFETY: [bottom, limit) lies between the last static and the live
        // stack frame; nothing else owns it (no heap)
        unsafe { ptr::write_volatile(addr as *mut u32, PAINT) };
        addr += 4;
    }
    WATERMARK.store(limit, Ordering::Relaxed);
}

/// Scan downwards from the last watermark
fn refresh() -> u32 {
    let bottom = (stack_bottom() + 3) & !3;
    let mut mark = WATERMARK.load(Ordering::Relaxed);
    let mut addr = mark;
    let mut clean = 0;

    while addr > bottom && clean < CLEAN_RUN {
        addr -= 4;
        // SAFETY: word-aligned address inside the painted region
        let word = unsafe { ptr::read_volatile(addr as *const u32) };
        if word == PAINT {
            clean += 1;
        } else {
            clean = 0;
            mark = addr;
        }
    }

    WATERMARK.fetch_min(mark, Ordering::Relaxed);
    mark
}

/// [`StackProbe`] reporting the shared stack for every task
#[derive(Clone, Copy, Default)]
pub struct PaintedStack;

impl StackProbe for PaintedStack {
    fn high_water(&self, _task: TaskId) -> u32 {
        stack_top().saturating_sub(refresh())
    }
}
