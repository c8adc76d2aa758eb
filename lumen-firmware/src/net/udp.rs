//! [`UdpEndpoint`] over an embassy-net UDP socket

use core::net::IpAddr;

use defmt::*;
use embassy_net::udp::{BindError, PacketMetadata, RecvError, SendError, UdpSocket};
use embassy_net::Stack;
use lumen_core::addr::Peer;
use lumen_core::echo::ECHO_BUFFER_LEN;
use lumen_core::traits::{NetError, UdpEndpoint};

const METADATA_SLOTS: usize = 4;

/// Socket buffers; must live as long as the socket
pub struct UdpBuffers {
    rx_meta: [PacketMetadata; METADATA_SLOTS],
    rx: [u8; ECHO_BUFFER_LEN],
    tx_meta: [PacketMetadata; METADATA_SLOTS],
    tx: [u8; ECHO_BUFFER_LEN],
}

impl UdpBuffers {
    pub const fn new() -> Self {
        Self {
            rx_meta: [PacketMetadata::EMPTY; METADATA_SLOTS],
            rx: [0; ECHO_BUFFER_LEN],
            tx_meta: [PacketMetadata::EMPTY; METADATA_SLOTS],
            tx: [0; ECHO_BUFFER_LEN],
        }
    }
}

pub struct NetUdp {
    socket: UdpSocket<'static>,
}

impl NetUdp {
    pub fn new(stack: Stack<'static>, buffers: &'static mut UdpBuffers) -> Self {
        let socket = UdpSocket::new(
            stack,
            &mut buffers.rx_meta,
            &mut buffers.rx,
            &mut buffers.tx_meta,
            &mut buffers.tx,
        );
        Self { socket }
    }
}

#[allow(unreachable_patterns)]
fn bind_error(e: BindError) -> NetError {
    match e {
        BindError::InvalidState => NetError::InvalidState,
        BindError::NoRoute => NetError::NoRoute,
        _ => NetError::Other(-99),
    }
}

#[allow(unreachable_patterns)]
fn recv_error(e: RecvError) -> NetError {
    match e {
        RecvError::Truncated => NetError::Truncated,
        _ => NetError::Other(-99),
    }
}

#[allow(unreachable_patterns)]
fn send_error(e: SendError) -> NetError {
    match e {
        SendError::NoRoute => NetError::NoRoute,
        SendError::SocketNotBound => NetError::InvalidState,
        SendError::PacketTooLarge => NetError::PacketTooLarge,
        _ => NetError::Other(-99),
    }
}

impl UdpEndpoint for NetUdp {
    fn bind(&mut self, port: u16) -> Result<(), NetError> {
        self.socket.bind(port).map_err(bind_error)
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, Peer), NetError> {
        loop {
            let (len, meta) = self.socket.recv_from(buf).await.map_err(recv_error)?;
            match IpAddr::from(meta.endpoint.addr) {
                IpAddr::V4(address) => return Ok((len, Peer::new(address, meta.endpoint.port))),
                IpAddr::V6(_) => debug!("Ignoring non-IPv4 datagram"),
            }
        }
    }

    async fn send_to(&mut self, buf: &[u8], peer: Peer) -> Result<(), NetError> {
        self.socket
            .send_to(buf, (peer.address, peer.port))
            .await
            .map_err(send_error)
    }
}
