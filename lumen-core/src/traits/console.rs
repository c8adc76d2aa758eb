//! Character-cell console trait

use core::fmt;

/// Character-cell terminal
///
/// Rows and columns are 1-based, as on a VT100. Plain [`fmt::Write`] output
/// goes to the current cursor position (the shell's scrolling region);
/// positioned writes save and restore the cursor around themselves.
pub trait Console: fmt::Write {
    /// Move the cursor
    fn move_to(&mut self, row: u8, col: u8);

    /// Erase from the cursor to the end of the line
    fn clear_to_eol(&mut self);

    /// Erase the whole screen and home the cursor
    fn clear_screen(&mut self);

    /// Restrict scrolling to rows `top..=bottom`
    fn set_scroll_region(&mut self, top: u8, bottom: u8);

    fn save_cursor(&mut self);

    fn restore_cursor(&mut self);

    /// Write `text` at a fixed position without moving the visible cursor
    fn put_at(&mut self, row: u8, col: u8, text: &str) {
        self.save_cursor();
        self.move_to(row, col);
        let _ = self.write_str(text);
        self.restore_cursor();
    }

    /// Like [`Console::put_at`] but also erases the rest of the line
    fn put_field(&mut self, row: u8, col: u8, text: &str) {
        self.save_cursor();
        self.move_to(row, col);
        let _ = self.write_str(text);
        self.clear_to_eol();
        self.restore_cursor();
    }
}
