//! In-RAM event log book
//!
//! Operator-visible events (link transitions, service failures, address
//! changes) are kept per category in small rings and dumped by the `log`
//! shell command. defmt output is for the debug probe; this is for whoever
//! sits at the serial console.

use core::cell::RefCell;
use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::{Deque, String, Vec};

/// Longest stored line; longer messages are truncated
pub const LOG_LINE_LEN: usize = 64;

/// Entries kept per category
pub const LOG_DEPTH: usize = 16;

pub type LogLine = String<LOG_LINE_LEN>;

/// Log categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogCategory {
    Info,
    Error,
    Debug,
}

impl LogCategory {
    /// Shell token naming this category
    pub fn name(self) -> &'static str {
        match self {
            LogCategory::Info => "info",
            LogCategory::Error => "error",
            LogCategory::Debug => "debug",
        }
    }

    const fn index(self) -> usize {
        match self {
            LogCategory::Info => 0,
            LogCategory::Error => 1,
            LogCategory::Debug => 2,
        }
    }
}

/// A stored log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position in the book across all categories
    pub sequence: u32,
    pub text: LogLine,
}

struct Rings {
    rings: [Deque<LogEntry, LOG_DEPTH>; 3],
    sequence: u32,
}

/// Fills a line up to capacity and silently drops the rest
struct Truncating<'a>(&'a mut LogLine);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// The log book
pub struct LogBook {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Rings>>,
}

impl LogBook {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Rings {
                rings: [Deque::new(), Deque::new(), Deque::new()],
                sequence: 0,
            })),
        }
    }

    /// Append an entry, evicting the oldest one of the category if full
    pub fn record(&self, category: LogCategory, args: fmt::Arguments<'_>) {
        let mut text = LogLine::new();
        let _ = Truncating(&mut text).write_fmt(args);

        self.inner.lock(|cell| {
            let mut book = cell.borrow_mut();
            let sequence = book.sequence;
            book.sequence = sequence.wrapping_add(1);

            let ring = &mut book.rings[category.index()];
            if ring.is_full() {
                ring.pop_front();
            }
            // Cannot fail: a slot was freed above
            let _ = ring.push_back(LogEntry { sequence, text });
        });
    }

    /// Copy of a category, oldest first
    ///
    /// Entries are copied out so the caller can print them without holding
    /// the critical section.
    pub fn entries(&self, category: LogCategory) -> Vec<LogEntry, LOG_DEPTH> {
        self.inner.lock(|cell| {
            cell.borrow().rings[category.index()]
                .iter()
                .cloned()
                .collect()
        })
    }

    /// Entries ever recorded, across all categories
    pub fn total(&self) -> u32 {
        self.inner.lock(|cell| cell.borrow().sequence)
    }
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new()
    }
}
