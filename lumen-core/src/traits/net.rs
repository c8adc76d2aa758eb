//! Packet engine, UDP endpoint and echo probe traits

use core::net::Ipv4Addr;

use crate::addr::{Ipv4Net, Peer};

/// Protocol layers that keep their own counters and trace switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layer {
    /// Ethernet framing (layer 2)
    Link,
    /// IPv4 (layer 3)
    Ipv4,
    /// UDP (layer 4)
    Udp,
}

impl Layer {
    /// All layers, bottom up
    pub const ALL: [Layer; 3] = [Layer::Link, Layer::Ipv4, Layer::Udp];

    /// Index into per-layer tables
    pub const fn index(self) -> usize {
        match self {
            Layer::Link => 0,
            Layer::Ipv4 => 1,
            Layer::Udp => 2,
        }
    }

    /// Short label used on the dashboard
    pub const fn label(self) -> &'static str {
        match self {
            Layer::Link => "ether",
            Layer::Ipv4 => "ip4",
            Layer::Udp => "udp",
        }
    }
}

/// Packet counters for one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerCounters {
    /// Inbound packets passed up the stack
    pub accepted: u32,
    /// Inbound packets discarded at this layer
    pub dropped: u32,
    /// Outbound packets handed down
    pub sent: u32,
}

/// Errors reported by the UDP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetError {
    /// Endpoint is not in a state that allows the call
    InvalidState,
    /// Port already bound by someone else
    AddressInUse,
    /// No route to the destination
    NoRoute,
    /// Datagram did not fit the buffer
    Truncated,
    /// Reply too large for the transmit path
    PacketTooLarge,
    /// Endpoint was closed underneath us
    Closed,
    /// Engine-specific failure code
    Other(i16),
}

impl NetError {
    /// Numeric code shown to the operator
    pub fn code(&self) -> i16 {
        match self {
            NetError::InvalidState => -1,
            NetError::AddressInUse => -2,
            NetError::NoRoute => -3,
            NetError::Truncated => -4,
            NetError::PacketTooLarge => -5,
            NetError::Closed => -6,
            NetError::Other(code) => *code,
        }
    }
}

/// Layered packet engine (link, IPv4, UDP)
///
/// All methods take `&self`: the engine is shared between the dashboard,
/// the shell and the UDP service, and keeps its own interior state.
pub trait PacketEngine {
    /// Whether the physical link is up
    fn link_up(&self) -> bool;

    /// Current interface address
    fn ipv4(&self) -> Ipv4Net;

    /// Replace the interface address and mask
    fn set_ipv4(&self, net: Ipv4Net);

    /// Counters for one layer
    fn counters(&self, layer: Layer) -> LayerCounters;

    /// Enable or disable packet tracing for one layer
    fn set_trace(&self, layer: Layer, enabled: bool);

    fn trace_enabled(&self, layer: Layer) -> bool;

    /// Enable or disable link-level loopback
    fn set_loopback(&self, enabled: bool);

    fn loopback_enabled(&self) -> bool;
}

/// One UDP endpoint
#[allow(async_fn_in_trait)]
pub trait UdpEndpoint {
    /// Bind to a local port
    fn bind(&mut self, port: u16) -> Result<(), NetError>;

    /// Wait for a datagram and copy it into `buf`
    ///
    /// Returns the payload length and the sender.
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, Peer), NetError>;

    /// Send one datagram
    async fn send_to(&mut self, buf: &[u8], peer: Peer) -> Result<(), NetError>;
}

/// Outcome of a failed echo probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeError {
    /// No reply within the timeout
    Timeout,
    /// Request could not be sent
    Failed(i16),
}

/// Successful echo reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeReply {
    /// Round-trip time in milliseconds
    pub rtt_ms: u32,
}

/// ICMP echo request/reply
#[allow(async_fn_in_trait)]
pub trait EchoProbe {
    /// Send one echo request and wait at most `timeout_ms` for the reply
    async fn probe(
        &mut self,
        target: Ipv4Addr,
        ident: u16,
        seq: u16,
        timeout_ms: u32,
    ) -> Result<ProbeReply, ProbeError>;
}
