//! [`EchoProbe`] over an embassy-net ICMP socket
//!
//! A fresh socket is bound to the probe's identifier for every request so
//! only replies carrying that identifier are delivered to it.

use core::net::IpAddr;

use embassy_net::icmp::{IcmpEndpoint, IcmpSocket, PacketMetadata, SendError};
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration, Instant};
use lumen_core::traits::{EchoProbe, NetError, ProbeError, ProbeReply};
use lumen_protocol::icmp::ECHO_HEADER_LEN;
use lumen_protocol::{encode_echo_request, parse_echo_reply, EchoId};

const PAYLOAD: &[u8] = b"lumen ping payload";
const SOCKET_BUFFER_LEN: usize = 256;

/// Socket buffers reused by every probe
pub struct ProbeBuffers {
    rx_meta: [PacketMetadata; 1],
    rx: [u8; SOCKET_BUFFER_LEN],
    tx_meta: [PacketMetadata; 1],
    tx: [u8; SOCKET_BUFFER_LEN],
}

impl ProbeBuffers {
    pub const fn new() -> Self {
        Self {
            rx_meta: [PacketMetadata::EMPTY; 1],
            rx: [0; SOCKET_BUFFER_LEN],
            tx_meta: [PacketMetadata::EMPTY; 1],
            tx: [0; SOCKET_BUFFER_LEN],
        }
    }
}

pub struct NetProbe {
    stack: Stack<'static>,
    buffers: &'static mut ProbeBuffers,
}

impl NetProbe {
    pub fn new(stack: Stack<'static>, buffers: &'static mut ProbeBuffers) -> Self {
        Self { stack, buffers }
    }
}

#[allow(unreachable_patterns)]
fn send_error(e: SendError) -> ProbeError {
    let error = match e {
        SendError::NoRoute => NetError::NoRoute,
        SendError::SocketNotBound => NetError::InvalidState,
        SendError::PacketTooLarge => NetError::PacketTooLarge,
        _ => NetError::Other(-99),
    };
    ProbeError::Failed(error.code())
}

impl EchoProbe for NetProbe {
    async fn probe(
        &mut self,
        target: core::net::Ipv4Addr,
        ident: u16,
        seq: u16,
        timeout_ms: u32,
    ) -> Result<ProbeReply, ProbeError> {
        let buffers = &mut *self.buffers;
        let mut socket = IcmpSocket::new(
            self.stack,
            &mut buffers.rx_meta,
            &mut buffers.rx,
            &mut buffers.tx_meta,
            &mut buffers.tx,
        );
        socket
            .bind(IcmpEndpoint::Ident(ident))
            .map_err(|_| ProbeError::Failed(NetError::InvalidState.code()))?;

        let id = EchoId { ident, seq };
        let mut request = [0u8; ECHO_HEADER_LEN + PAYLOAD.len()];
        let len = encode_echo_request(&mut request, id, PAYLOAD)
            .map_err(|_| ProbeError::Failed(NetError::PacketTooLarge.code()))?;

        let sent_at = Instant::now();
        socket
            .send_to(&request[..len], target)
            .await
            .map_err(send_error)?;

        let reply = async {
            let mut packet = [0u8; SOCKET_BUFFER_LEN];
            loop {
                let (n, from) = socket
                    .recv_from(&mut packet)
                    .await
                    .map_err(|_| ProbeError::Failed(NetError::Truncated.code()))?;
                if IpAddr::from(from) != IpAddr::V4(target) {
                    continue;
                }
                // Late replies to earlier sequence numbers are skipped
                if parse_echo_reply(&packet[..n]) == Ok(id) {
                    return Ok(());
                }
            }
        };

        match with_timeout(Duration::from_millis(timeout_ms.into()), reply).await {
            Ok(Ok(())) => Ok(ProbeReply {
                rtt_ms: sent_at.elapsed().as_millis() as u32,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}
