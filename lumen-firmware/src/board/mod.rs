//! W5500-EVB-Pico board support
//!
//! Pin assignments and memory map for the RP2040 + W5500 board.
//!
//! | Function        | Pin       |
//! |-----------------|-----------|
//! | Console TX / RX | GPIO0/1   |
//! | LED R / G / B   | GPIO6/7/8 |
//! | W5500 MISO      | GPIO16    |
//! | W5500 CS        | GPIO17    |
//! | W5500 SCK       | GPIO18    |
//! | W5500 MOSI      | GPIO19    |
//! | W5500 RESET     | GPIO20    |
//! | W5500 INT       | GPIO21    |

pub mod diag;
pub mod stack;

pub use diag::BoardDiagnostics;
pub use stack::PaintedStack;

pub const FLASH_BASE: u32 = 0x1000_0000;
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const RAM_BASE: u32 = 0x2000_0000;

/// W5500 SPI clock
pub const SPI_FREQUENCY_HZ: u32 = 50_000_000;

pub const CONSOLE_BAUD: u32 = 115_200;

/// LED channels are driven high to light
pub const LED_ACTIVE_LOW: bool = false;

/// Locally administered MAC derived from the flash unique ID
pub fn mac_address(uid: &[u8; 8]) -> [u8; 6] {
    [0x02, uid[3], uid[4], uid[5], uid[6], uid[7]]
}

/// Network stack seed from the flash unique ID
pub fn stack_seed(uid: &[u8; 8]) -> u64 {
    u64::from_le_bytes(*uid)
}
