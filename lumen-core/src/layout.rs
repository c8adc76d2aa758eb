//! Screen layout
//!
//! ```text
//!  1  lumen network demo
//!  2
//!  3  link       up
//!  4  ip4 addr   192.168.1.50       mask 255.255.255.0
//!  5
//!  6             accepted     dropped        sent
//!  7  ether             12           0           9
//!  8  ip4               10           2           9
//!  9  udp                4           0           4
//! 10
//! 11  udp from   10.0.0.7:5000 (5 bytes, red)
//! 12  red
//! 13  ------------------------------------------------
//! 14+ shell scrolling region
//! ```
//!
//! Every field ends at or before [`MIN_COLS`]; a narrower console would wrap
//! the datagram preview onto the separator.

use lumen_protocol::PREVIEW_LIMIT;

pub const TITLE_ROW: u8 = 1;

pub const LINK_ROW: u8 = 3;
pub const ADDR_ROW: u8 = 4;
/// Column of all value fields in the top block
pub const VALUE_COL: u8 = 12;
pub const MASK_LABEL_COL: u8 = 31;
pub const MASK_COL: u8 = 36;
/// Width the address field is padded to
pub const ADDR_WIDTH: usize = 15;

pub const COUNTER_HEADER_ROW: u8 = 6;
/// First counter row; layers follow in [`crate::traits::Layer::ALL`] order
pub const COUNTER_FIRST_ROW: u8 = 7;
/// Columns of the accepted, dropped and sent counters
pub const COUNTER_COLS: [u8; 3] = [12, 24, 36];
/// Counters are right aligned to this width
pub const COUNTER_WIDTH: usize = 10;

/// Sender of the last datagram, written at [`VALUE_COL`]
pub const ECHO_PEER_ROW: u8 = 11;
/// Longest sender description or service failure message
pub const ECHO_PEER_WIDTH: usize = 64;
/// Preview of the last datagram
pub const ECHO_TEXT_ROW: u8 = 12;
pub const ECHO_TEXT_COL: u8 = 1;

pub const SEPARATOR_ROW: u8 = 13;

/// First row of the shell scrolling region
pub const SHELL_TOP: u8 = 14;

/// Fewest console rows that leave a usable shell region
pub const MIN_ROWS: u8 = SHELL_TOP + 4;

/// Fewest console columns that hold a full datagram preview
pub const MIN_COLS: u8 = PREVIEW_LIMIT as u8;

pub const SEPARATOR: &str = "------------------------------------------------";

/// Row for counters of the layer at `index`
pub const fn counter_row(index: usize) -> u8 {
    COUNTER_FIRST_ROW + index as u8
}
