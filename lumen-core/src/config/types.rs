//! Configuration type definitions

use core::net::Ipv4Addr;

use crate::addr::Ipv4Net;

/// Network defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkConfig {
    /// Interface address applied at boot
    pub address: Ipv4Net,
    /// Port the echo service binds to
    pub udp_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: Ipv4Net::new(Ipv4Addr::new(192, 168, 1, 50), 24)
                .unwrap_or(Ipv4Net::UNSPECIFIED),
            // RFC 862 echo
            udp_port: 7,
        }
    }
}

/// Console geometry
///
/// `cols` must leave room for the full datagram preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsoleConfig {
    pub rows: u8,
    pub cols: u8,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Periods of the periodic tasks, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskPeriods {
    pub heartbeat_ms: u32,
    pub stats_ms: u32,
    pub stack_ms: u32,
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self {
            heartbeat_ms: 500,
            stats_ms: 250,
            stack_ms: 50,
        }
    }
}

/// `ping` command parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PingConfig {
    /// Probes per invocation
    pub count: u16,
    /// Per-probe reply timeout
    pub timeout_ms: u32,
    /// Delay between probes
    pub interval_ms: u32,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            count: 8,
            timeout_ms: 3000,
            interval_ms: 1000,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub console: ConsoleConfig,
    pub tasks: TaskPeriods,
    pub ping: PingConfig,
}
