//! IPv4 addressing types shared by the shell, dashboard and UDP service

use core::fmt;
use core::net::Ipv4Addr;
use core::str::FromStr;

/// Errors parsing an `a.b.c.d/prefix` address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddrParseError {
    /// No `/prefix` part
    MissingPrefix,
    /// Dotted quad is malformed
    InvalidAddress,
    /// Prefix is not a number in `0..=32`
    InvalidPrefix,
}

/// Interface address with its prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Net {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Net {
    /// `0.0.0.0/0`, used before any address is configured
    pub const UNSPECIFIED: Ipv4Net = Ipv4Net {
        address: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Longest valid prefix
    pub const MAX_PREFIX: u8 = 32;

    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, AddrParseError> {
        if prefix_len > Self::MAX_PREFIX {
            return Err(AddrParseError::InvalidPrefix);
        }
        Ok(Self {
            address,
            prefix_len,
        })
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Subnet mask derived from the prefix length
    pub fn netmask(&self) -> Ipv4Addr {
        let bits = match self.prefix_len {
            0 => 0,
            n => u32::MAX << (32 - u32::from(n)),
        };
        Ipv4Addr::from(bits)
    }
}

impl FromStr for Ipv4Net {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, prefix) = s.split_once('/').ok_or(AddrParseError::MissingPrefix)?;
        let address: Ipv4Addr = address
            .parse()
            .map_err(|_| AddrParseError::InvalidAddress)?;
        let prefix_len: u8 = prefix.parse().map_err(|_| AddrParseError::InvalidPrefix)?;
        Self::new(address, prefix_len)
    }
}

impl fmt::Display for Ipv4Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ipv4Net {
    fn format(&self, f: defmt::Formatter) {
        let [a, b, c, d] = self.address.octets();
        defmt::write!(f, "{}.{}.{}.{}/{}", a, b, c, d, self.prefix_len)
    }
}

/// Remote UDP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl Peer {
    pub const fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address, port }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Peer {
    fn format(&self, f: defmt::Formatter) {
        let [a, b, c, d] = self.address.octets();
        defmt::write!(f, "{}.{}.{}.{}:{}", a, b, c, d, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        let net: Ipv4Net = "10.0.0.5/24".parse().unwrap();
        assert_eq!(net.address(), Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(net.prefix_len(), 24);
        assert_eq!(net.netmask(), Ipv4Addr::new(255, 255, 255, 0));
    }

    #[test]
    fn test_netmask_edges() {
        let any = Ipv4Net::new(Ipv4Addr::UNSPECIFIED, 0).unwrap();
        assert_eq!(any.netmask(), Ipv4Addr::UNSPECIFIED);

        let host = Ipv4Net::new(Ipv4Addr::new(1, 2, 3, 4), 32).unwrap();
        assert_eq!(host.netmask(), Ipv4Addr::BROADCAST);

        let odd = Ipv4Net::new(Ipv4Addr::new(1, 2, 3, 4), 20).unwrap();
        assert_eq!(odd.netmask(), Ipv4Addr::new(255, 255, 240, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "10.0.0.5".parse::<Ipv4Net>(),
            Err(AddrParseError::MissingPrefix)
        );
        assert_eq!(
            "10.0.5/24".parse::<Ipv4Net>(),
            Err(AddrParseError::InvalidAddress)
        );
        assert_eq!(
            "10.0.0.5/33".parse::<Ipv4Net>(),
            Err(AddrParseError::InvalidPrefix)
        );
        assert_eq!(
            "10.0.0.5/x".parse::<Ipv4Net>(),
            Err(AddrParseError::InvalidPrefix)
        );
    }

    #[test]
    fn test_display() {
        let net: Ipv4Net = "192.168.1.50/24".parse().unwrap();
        assert_eq!(format!("{}", net), "192.168.1.50/24");
        let peer = Peer::new(Ipv4Addr::new(10, 1, 2, 3), 5000);
        assert_eq!(format!("{}", peer), "10.1.2.3:5000");
    }
}
