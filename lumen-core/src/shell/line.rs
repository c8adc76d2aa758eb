//! Serial line editor

use heapless::String;

/// Longest accepted command line
pub const LINE_CAPACITY: usize = 96;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Nothing to show
    Ignored,
    /// Character appended; echo it
    Echo(char),
    /// Last character removed; erase it on screen
    Erase,
    /// Line complete; collect it with [`LineEditor::take`]
    Submit,
    /// Line was too long and has been discarded
    Overflow,
}

/// Accumulates a command line from raw serial bytes
#[derive(Debug, Default)]
pub struct LineEditor {
    line: String<LINE_CAPACITY>,
    overflowed: bool,
    after_cr: bool,
}

impl LineEditor {
    pub const fn new() -> Self {
        Self {
            line: String::new(),
            overflowed: false,
            after_cr: false,
        }
    }

    pub fn feed(&mut self, byte: u8) -> Edit {
        let after_cr = core::mem::replace(&mut self.after_cr, byte == b'\r');

        match byte {
            // CR LF from terminals that send both
            b'\n' if after_cr => Edit::Ignored,
            b'\r' | b'\n' => {
                if core::mem::take(&mut self.overflowed) {
                    self.line.clear();
                    Edit::Overflow
                } else {
                    Edit::Submit
                }
            }
            BACKSPACE | DELETE => {
                if !self.overflowed && self.line.pop().is_some() {
                    Edit::Erase
                } else {
                    Edit::Ignored
                }
            }
            0x20..=0x7e => {
                let ch = byte as char;
                if self.overflowed || self.line.push(ch).is_err() {
                    self.overflowed = true;
                    Edit::Ignored
                } else {
                    Edit::Echo(ch)
                }
            }
            _ => Edit::Ignored,
        }
    }

    /// Move the current line out, leaving the editor empty
    pub fn take(&mut self) -> String<LINE_CAPACITY> {
        self.overflowed = false;
        core::mem::take(&mut self.line)
    }
}
