//! Contracts between the application logic and the board
//!
//! The board crate implements these on top of its network stack, serial
//! port and chip services; tests implement them with mocks.

pub mod console;
pub mod net;
pub mod system;

pub use console::Console;
pub use net::{
    EchoProbe, Layer, LayerCounters, NetError, PacketEngine, ProbeError, ProbeReply, UdpEndpoint,
};
pub use system::{ClockInfo, Diagnostics, MemoryUsage, ResetCause, StackProbe};
