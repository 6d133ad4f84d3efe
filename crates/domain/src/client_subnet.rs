use crate::DomainError;
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;

/// Source prefix sent for IPv4 clients in the EDNS Client Subnet option.
pub const ECS_IPV4_PREFIX: u8 = 24;
/// Source prefix sent for IPv6 clients in the EDNS Client Subnet option.
pub const ECS_IPV6_PREFIX: u8 = 56;

/// Masked client network carried in EDNS Client Subnet (RFC 7871).
///
/// Also part of the cache key when ECS is on, so answers tailored for one
/// subnet are never served to clients of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientSubnet {
    network: IpNetwork,
}

impl ClientSubnet {
    pub fn new(ip: IpAddr, prefix: u8) -> Result<Self, DomainError> {
        let network = IpNetwork::new(ip, prefix)
            .map_err(|e| DomainError::InvalidIpAddress(format!("{}/{}: {}", ip, prefix, e)))?;
        let masked = IpNetwork::new(network.network(), prefix)
            .map_err(|e| DomainError::InvalidIpAddress(format!("{}/{}: {}", ip, prefix, e)))?;
        Ok(Self { network: masked })
    }

    pub fn from_client_ip(ip: IpAddr) -> Result<Self, DomainError> {
        match ip {
            IpAddr::V4(_) => Self::new(ip, ECS_IPV4_PREFIX),
            IpAddr::V6(_) => Self::new(ip, ECS_IPV6_PREFIX),
        }
    }

    pub fn address(&self) -> IpAddr {
        self.network.ip()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Address family number (1 = IPv4, 2 = IPv6).
    pub fn family(&self) -> u16 {
        match self.network {
            IpNetwork::V4(_) => 1,
            IpNetwork::V6(_) => 2,
        }
    }

    /// Address bytes truncated to the prefix length, as sent on the wire.
    pub fn wire_address(&self) -> Vec<u8> {
        let significant = self.prefix().div_ceil(8) as usize;
        let octets = match self.address() {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        octets[..significant.min(octets.len())].to_vec()
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.network.contains(ip)
    }
}

impl fmt::Display for ClientSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.network)
    }
}
