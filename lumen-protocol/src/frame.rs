//! Ethernet/IPv4/UDP frame inspection
//!
//! Used by the board's link driver to keep per-layer counters and to emit
//! packet traces. Nothing here modifies a frame; it only reads headers.
//!
//! Frame layout:
//! - ETHERNET (14 bytes): destination MAC, source MAC, ethertype
//! - IPV4 (20-60 bytes): version/IHL, ..., total length, ..., protocol, src, dst
//! - UDP (8 bytes): source port, destination port, length, checksum

/// Ethernet header length
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Minimum IPv4 header length
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// UDP header length
pub const UDP_HEADER_LEN: usize = 8;

/// Ethertype for IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Ethertype for ARP
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// IPv4 protocol number for ICMP
pub const IP_PROTO_ICMP: u8 = 1;

/// IPv4 protocol number for UDP
pub const IP_PROTO_UDP: u8 = 17;

/// Header-level problems found while inspecting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame shorter than the header it claims to carry
    Truncated,
    /// Header fields are inconsistent
    InvalidHeader,
    /// Frame is well formed but addressed elsewhere
    NotForUs,
}

/// Per-layer outcome of an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    Accepted,
    Dropped(FrameError),
}

impl Verdict {
    /// Whether the layer accepted the frame
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Ethernet header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EthernetHeader {
    pub dst: [u8; 6],
    pub src: [u8; 6],
    pub ethertype: u16,
}

/// IPv4 header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ipv4Header {
    pub src: [u8; 4],
    pub dst: [u8; 4],
    pub protocol: u8,
    pub header_len: usize,
    pub total_len: usize,
}

/// UDP header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: usize,
}

/// Result of inspecting a received frame
///
/// A layer only has a verdict when the layer below accepted the frame and
/// identified it as carrying that protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inbound {
    pub link: Verdict,
    pub ipv4: Option<Verdict>,
    pub udp: Option<Verdict>,
    pub ethernet: Option<EthernetHeader>,
    pub ipv4_header: Option<Ipv4Header>,
    pub udp_header: Option<UdpHeader>,
}

/// Which layers a transmitted frame counts as sent for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outbound {
    pub link: bool,
    pub ipv4: bool,
    pub udp: bool,
    pub ethernet: Option<EthernetHeader>,
    pub ipv4_header: Option<Ipv4Header>,
    pub udp_header: Option<UdpHeader>,
}

fn be16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Parse the Ethernet header
pub fn parse_ethernet(frame: &[u8]) -> Result<EthernetHeader, FrameError> {
    if frame.len() < ETHERNET_HEADER_LEN {
        return Err(FrameError::Truncated);
    }

    let mut dst = [0u8; 6];
    let mut src = [0u8; 6];
    dst.copy_from_slice(&frame[0..6]);
    src.copy_from_slice(&frame[6..12]);

    Ok(EthernetHeader {
        dst,
        src,
        ethertype: be16(frame, 12),
    })
}

/// Parse an IPv4 header from the start of `packet`
pub fn parse_ipv4(packet: &[u8]) -> Result<Ipv4Header, FrameError> {
    if packet.len() < IPV4_MIN_HEADER_LEN {
        return Err(FrameError::Truncated);
    }

    let version = packet[0] >> 4;
    let header_len = ((packet[0] & 0x0F) as usize) * 4;
    if version != 4 || header_len < IPV4_MIN_HEADER_LEN {
        return Err(FrameError::InvalidHeader);
    }

    let total_len = be16(packet, 2) as usize;
    if total_len < header_len {
        return Err(FrameError::InvalidHeader);
    }
    if total_len > packet.len() {
        return Err(FrameError::Truncated);
    }

    let mut src = [0u8; 4];
    let mut dst = [0u8; 4];
    src.copy_from_slice(&packet[12..16]);
    dst.copy_from_slice(&packet[16..20]);

    Ok(Ipv4Header {
        src,
        dst,
        protocol: packet[9],
        header_len,
        total_len,
    })
}

/// Parse a UDP header from the start of `segment`
pub fn parse_udp(segment: &[u8]) -> Result<UdpHeader, FrameError> {
    if segment.len() < UDP_HEADER_LEN {
        return Err(FrameError::Truncated);
    }

    let length = be16(segment, 4) as usize;
    if length < UDP_HEADER_LEN {
        return Err(FrameError::InvalidHeader);
    }
    if length > segment.len() {
        return Err(FrameError::Truncated);
    }

    Ok(UdpHeader {
        src_port: be16(segment, 0),
        dst_port: be16(segment, 2),
        length,
    })
}

fn mac_is_ours(dst: &[u8; 6], mac: &[u8; 6]) -> bool {
    // Group bit covers broadcast and multicast
    dst == mac || dst[0] & 0x01 != 0
}

fn ipv4_is_ours(dst: &[u8; 4], local: [u8; 4]) -> bool {
    dst == &local
        || dst == &[255, 255, 255, 255]
        || (dst[0] & 0xF0) == 0xE0
        || local == [0, 0, 0, 0]
}

/// Inspect a frame received from the wire
///
/// `mac` is the interface hardware address and `local` the configured IPv4
/// address (`0.0.0.0` while unconfigured, which accepts any destination).
pub fn inspect_inbound(frame: &[u8], mac: [u8; 6], local: [u8; 4]) -> Inbound {
    let mut result = Inbound {
        link: Verdict::Accepted,
        ipv4: None,
        udp: None,
        ethernet: None,
        ipv4_header: None,
        udp_header: None,
    };

    let eth = match parse_ethernet(frame) {
        Ok(eth) => eth,
        Err(e) => {
            result.link = Verdict::Dropped(e);
            return result;
        }
    };
    result.ethernet = Some(eth);

    if !mac_is_ours(&eth.dst, &mac) {
        result.link = Verdict::Dropped(FrameError::NotForUs);
        return result;
    }
    if eth.ethertype != ETHERTYPE_IPV4 {
        return result;
    }

    let packet = &frame[ETHERNET_HEADER_LEN..];
    let ip = match parse_ipv4(packet) {
        Ok(ip) => ip,
        Err(e) => {
            result.ipv4 = Some(Verdict::Dropped(e));
            return result;
        }
    };
    result.ipv4_header = Some(ip);

    if !ipv4_is_ours(&ip.dst, local) {
        result.ipv4 = Some(Verdict::Dropped(FrameError::NotForUs));
        return result;
    }
    result.ipv4 = Some(Verdict::Accepted);

    if ip.protocol != IP_PROTO_UDP {
        return result;
    }

    let segment = &packet[ip.header_len..ip.total_len];
    result.udp = Some(match parse_udp(segment) {
        Ok(udp) => {
            result.udp_header = Some(udp);
            Verdict::Accepted
        }
        Err(e) => Verdict::Dropped(e),
    });

    result
}

/// Inspect a frame handed to the wire
///
/// Frames the stack produces are trusted; a layer counts as sent when its
/// header is present and parses.
pub fn inspect_outbound(frame: &[u8]) -> Outbound {
    let mut result = Outbound::default();

    let Ok(eth) = parse_ethernet(frame) else {
        return result;
    };
    result.link = true;
    result.ethernet = Some(eth);

    if eth.ethertype != ETHERTYPE_IPV4 {
        return result;
    }

    let packet = &frame[ETHERNET_HEADER_LEN..];
    let Ok(ip) = parse_ipv4(packet) else {
        return result;
    };
    result.ipv4 = true;
    result.ipv4_header = Some(ip);

    if ip.protocol == IP_PROTO_UDP {
        if let Ok(udp) = parse_udp(&packet[ip.header_len..ip.total_len]) {
            result.udp = true;
            result.udp_header = Some(udp);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    const MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
    const PEER_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x99];
    const LOCAL: [u8; 4] = [10, 0, 0, 5];
    const PEER: [u8; 4] = [10, 0, 0, 9];

    fn udp_frame(dst_mac: [u8; 6], dst_ip: [u8; 4], payload: &[u8]) -> Vec<u8, 256> {
        let udp_len = UDP_HEADER_LEN + payload.len();
        let ip_len = IPV4_MIN_HEADER_LEN + udp_len;

        let mut f = Vec::new();
        f.extend_from_slice(&dst_mac).unwrap();
        f.extend_from_slice(&PEER_MAC).unwrap();
        f.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes()).unwrap();

        f.extend_from_slice(&[0x45, 0x00]).unwrap();
        f.extend_from_slice(&(ip_len as u16).to_be_bytes()).unwrap();
        f.extend_from_slice(&[0, 0, 0, 0, 64, IP_PROTO_UDP, 0, 0]).unwrap();
        f.extend_from_slice(&PEER).unwrap();
        f.extend_from_slice(&dst_ip).unwrap();

        f.extend_from_slice(&40000u16.to_be_bytes()).unwrap();
        f.extend_from_slice(&7u16.to_be_bytes()).unwrap();
        f.extend_from_slice(&(udp_len as u16).to_be_bytes()).unwrap();
        f.extend_from_slice(&[0, 0]).unwrap();
        f.extend_from_slice(payload).unwrap();
        f
    }

    #[test]
    fn test_udp_frame_accepted_on_all_layers() {
        let frame = udp_frame(MAC, LOCAL, b"red");
        let r = inspect_inbound(&frame, MAC, LOCAL);

        assert_eq!(r.link, Verdict::Accepted);
        assert_eq!(r.ipv4, Some(Verdict::Accepted));
        assert_eq!(r.udp, Some(Verdict::Accepted));

        let udp = r.udp_header.unwrap();
        assert_eq!(udp.dst_port, 7);
        assert_eq!(udp.length, UDP_HEADER_LEN + 3);
    }

    #[test]
    fn test_runt_frame_dropped_at_link() {
        let r = inspect_inbound(&[0u8; 10], MAC, LOCAL);
        assert_eq!(r.link, Verdict::Dropped(FrameError::Truncated));
        assert_eq!(r.ipv4, None);
    }

    #[test]
    fn test_foreign_unicast_mac_dropped() {
        let frame = udp_frame(PEER_MAC, LOCAL, b"x");
        let r = inspect_inbound(&frame, MAC, LOCAL);
        assert_eq!(r.link, Verdict::Dropped(FrameError::NotForUs));
    }

    #[test]
    fn test_broadcast_mac_accepted() {
        let frame = udp_frame([0xFF; 6], [255, 255, 255, 255], b"x");
        let r = inspect_inbound(&frame, MAC, LOCAL);
        assert!(r.link.is_accepted());
        assert_eq!(r.ipv4, Some(Verdict::Accepted));
    }

    #[test]
    fn test_foreign_ip_dropped_at_ipv4() {
        let frame = udp_frame(MAC, [10, 0, 0, 77], b"x");
        let r = inspect_inbound(&frame, MAC, LOCAL);
        assert!(r.link.is_accepted());
        assert_eq!(r.ipv4, Some(Verdict::Dropped(FrameError::NotForUs)));
        assert_eq!(r.udp, None);
    }

    #[test]
    fn test_unconfigured_address_accepts_any_destination() {
        let frame = udp_frame(MAC, [10, 0, 0, 77], b"x");
        let r = inspect_inbound(&frame, MAC, [0, 0, 0, 0]);
        assert_eq!(r.ipv4, Some(Verdict::Accepted));
    }

    #[test]
    fn test_bad_ip_version_dropped() {
        let mut frame = udp_frame(MAC, LOCAL, b"x");
        frame[ETHERNET_HEADER_LEN] = 0x65;
        let r = inspect_inbound(&frame, MAC, LOCAL);
        assert_eq!(r.ipv4, Some(Verdict::Dropped(FrameError::InvalidHeader)));
    }

    #[test]
    fn test_bad_udp_length_dropped() {
        let mut frame = udp_frame(MAC, LOCAL, b"abc");
        let at = ETHERNET_HEADER_LEN + IPV4_MIN_HEADER_LEN + 4;
        frame[at..at + 2].copy_from_slice(&4u16.to_be_bytes());
        let r = inspect_inbound(&frame, MAC, LOCAL);
        assert_eq!(r.udp, Some(Verdict::Dropped(FrameError::InvalidHeader)));
    }

    #[test]
    fn test_arp_has_no_ip_verdict() {
        let mut frame = udp_frame(MAC, LOCAL, b"");
        frame[12..14].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());
        let r = inspect_inbound(&frame, MAC, LOCAL);
        assert!(r.link.is_accepted());
        assert_eq!(r.ipv4, None);
    }

    #[test]
    fn test_outbound_counts_each_layer() {
        let frame = udp_frame(PEER_MAC, PEER, b"redA");
        let out = inspect_outbound(&frame);
        assert!(out.link && out.ipv4 && out.udp);

        let mut arp = frame.clone();
        arp[12..14].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());
        let out = inspect_outbound(&arp);
        assert!(out.link);
        assert!(!out.ipv4 && !out.udp);
    }
}
