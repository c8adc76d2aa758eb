//! State shared between tasks
//!
//! Everything here is created once at boot and lives for the whole run.

use embassy_rp::gpio::Output;
use embassy_rp::uart::BufferedUartTx;
use lumen_core::console::{AnsiTerminal, SharedConsole};
use lumen_core::indicator::{RgbLed, StatusIndicator};
use lumen_core::log::LogBook;
use lumen_core::tasks::TaskRegistry;

use crate::net::EngineStats;

/// Onboard RGB LED
pub type Led = RgbLed<Output<'static>, Output<'static>, Output<'static>>;

/// ANSI terminal on the console UART
pub type SerialConsole = AnsiTerminal<BufferedUartTx>;

pub type Indicator = StatusIndicator<Led>;

pub type Console = SharedConsole<SerialConsole>;

/// Operator-visible event log (`log` command)
pub static LOG: LogBook = LogBook::new();

/// Descriptors of the fixed task set
pub static TASKS: TaskRegistry = TaskRegistry::new();

/// Per-layer counters and switches of the link driver
pub static NET_STATS: EngineStats = EngineStats::new();
