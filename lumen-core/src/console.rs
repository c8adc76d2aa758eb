//! VT100/ANSI console over a byte writer
//!
//! The serial port is shared by the dashboard, the UDP service and the
//! shell. Every multi-write sequence must hold [`SharedConsole`] for its
//! whole duration.

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use crate::traits::Console;

/// Console guarded by the console-wide lock
pub type SharedConsole<C> = Mutex<CriticalSectionRawMutex, C>;

/// ANSI terminal driver
///
/// Translates `\n` to `\r\n`. Write errors are dropped: there is nowhere
/// else to report them.
pub struct AnsiTerminal<W> {
    writer: W,
}

impl<W: embedded_io::Write> AnsiTerminal<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn raw(&mut self, bytes: &[u8]) {
        let _ = self.writer.write_all(bytes);
    }

    fn csi(&mut self, args: fmt::Arguments<'_>) {
        let mut seq: heapless::String<16> = heapless::String::new();
        if fmt::Write::write_fmt(&mut seq, args).is_ok() {
            self.raw(b"\x1b[");
            self.raw(seq.as_bytes());
        }
    }

    /// Push buffered output to the wire
    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl<W: embedded_io::Write> fmt::Write for AnsiTerminal<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.raw(first.as_bytes());
        }
        for line in lines {
            self.raw(b"\r\n");
            self.raw(line.as_bytes());
        }
        Ok(())
    }
}

impl<W: embedded_io::Write> Console for AnsiTerminal<W> {
    fn move_to(&mut self, row: u8, col: u8) {
        self.csi(format_args!("{};{}H", row, col));
    }

    fn clear_to_eol(&mut self) {
        self.raw(b"\x1b[K");
    }

    fn clear_screen(&mut self) {
        self.raw(b"\x1b[2J\x1b[H");
    }

    fn set_scroll_region(&mut self, top: u8, bottom: u8) {
        self.csi(format_args!("{};{}r", top, bottom));
    }

    fn save_cursor(&mut self) {
        self.raw(b"\x1b7");
    }

    fn restore_cursor(&mut self) {
        self.raw(b"\x1b8");
    }
}
