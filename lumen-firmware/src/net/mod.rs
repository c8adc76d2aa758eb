//! Network adapters
//!
//! Bridges the W5500 driver and embassy-net to the contracts in
//! `lumen_core::traits`.

pub mod driver;
pub mod engine;
pub mod probe;
pub mod stats;
pub mod udp;

pub use driver::CountingDriver;
pub use engine::NetEngine;
pub use probe::{NetProbe, ProbeBuffers};
pub use stats::EngineStats;
pub use udp::{NetUdp, UdpBuffers};
