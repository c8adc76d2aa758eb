//! ICMPv4 echo messages
//!
//! Only what `ping` needs: build an echo request with a chosen identifier
//! and sequence number, and recognize the matching echo reply.
//!
//! ```text
//! ┌──────┬──────┬──────────┬───────┬──────────┬─────────────┐
//! │ TYPE │ CODE │ CHECKSUM │ IDENT │ SEQUENCE │ PAYLOAD ... │
//! │  1B  │  1B  │    2B    │  2B   │    2B    │             │
//! └──────┴──────┴──────────┴───────┴──────────┴─────────────┘
//! ```

/// Echo header length
pub const ECHO_HEADER_LEN: usize = 8;

const ECHO_REQUEST: u8 = 8;
const ECHO_REPLY: u8 = 0;

/// Errors building or reading echo messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IcmpError {
    /// Buffer too small for header plus payload
    BufferTooSmall,
    /// Shorter than an echo header
    Truncated,
    /// Not an echo reply
    NotEchoReply,
    /// Checksum does not verify
    BadChecksum,
}

/// Identifier and sequence of an echo message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EchoId {
    pub ident: u16,
    pub seq: u16,
}

/// Internet checksum (RFC 1071) over `data`
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for pair in &mut chunks {
        sum += u32::from(u16::from_be_bytes([pair[0], pair[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Write an echo request into `buf`, returning its length
pub fn encode_echo_request(buf: &mut [u8], id: EchoId, payload: &[u8]) -> Result<usize, IcmpError> {
    let len = ECHO_HEADER_LEN + payload.len();
    if buf.len() < len {
        return Err(IcmpError::BufferTooSmall);
    }

    buf[0] = ECHO_REQUEST;
    buf[1] = 0;
    buf[2..4].copy_from_slice(&[0, 0]);
    buf[4..6].copy_from_slice(&id.ident.to_be_bytes());
    buf[6..8].copy_from_slice(&id.seq.to_be_bytes());
    buf[ECHO_HEADER_LEN..len].copy_from_slice(payload);

    let sum = checksum(&buf[..len]);
    buf[2..4].copy_from_slice(&sum.to_be_bytes());
    Ok(len)
}

/// Read an echo reply, verifying its checksum
pub fn parse_echo_reply(packet: &[u8]) -> Result<EchoId, IcmpError> {
    if packet.len() < ECHO_HEADER_LEN {
        return Err(IcmpError::Truncated);
    }
    if packet[0] != ECHO_REPLY || packet[1] != 0 {
        return Err(IcmpError::NotEchoReply);
    }
    if checksum(packet) != 0 {
        return Err(IcmpError::BadChecksum);
    }

    Ok(EchoId {
        ident: u16::from_be_bytes([packet[4], packet[5]]),
        seq: u16::from_be_bytes([packet[6], packet[7]]),
    })
}
