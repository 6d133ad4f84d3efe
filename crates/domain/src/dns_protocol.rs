use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_DNS_PORT: u16 = 53;
pub const DEFAULT_DOT_PORT: u16 = 853;
pub const DEFAULT_DOH_PORT: u16 = 443;

pub const MISSING_PORT: &str = "missing port in address";

/// Upstream server address that may or may not be resolved to an IP yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamAddr {
    Resolved(SocketAddr),
    Unresolved { hostname: Arc<str>, port: u16 },
}

impl UpstreamAddr {
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            UpstreamAddr::Resolved(addr) => Some(*addr),
            UpstreamAddr::Unresolved { .. } => None,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            UpstreamAddr::Resolved(addr) => addr.port(),
            UpstreamAddr::Unresolved { port, .. } => *port,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, UpstreamAddr::Unresolved { .. })
    }

    /// Returns (hostname, port) if this address is unresolved.
    pub fn unresolved_parts(&self) -> Option<(&str, u16)> {
        match self {
            UpstreamAddr::Unresolved { hostname, port } => Some((hostname, *port)),
            UpstreamAddr::Resolved(_) => None,
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamAddr::Resolved(addr) => write!(f, "{}", addr),
            UpstreamAddr::Unresolved { hostname, port } => write!(f, "{}:{}", hostname, port),
        }
    }
}

/// Transport and address of one upstream resolver.
///
/// Plain `host:port` entries parse as `Udp` (with TCP fallback on truncation).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DnsProtocol {
    Udp {
        addr: UpstreamAddr,
    },
    Tcp {
        addr: UpstreamAddr,
    },
    Tls {
        addr: UpstreamAddr,
        hostname: Arc<str>,
    },
    Https {
        url: Arc<str>,
        hostname: Arc<str>,
        addr: UpstreamAddr,
    },
}

impl DnsProtocol {
    /// Parses an upstream address. `default_port` applies to plain, `udp://`
    /// and `tcp://` entries; `None` makes the port mandatory.
    pub fn parse_with_default_port(s: &str, default_port: Option<u16>) -> Result<Self, String> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix("udp://") {
            let addr = parse_upstream_addr(rest, default_port)?;
            return Ok(DnsProtocol::Udp { addr });
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            let addr = parse_upstream_addr(rest, default_port)?;
            return Ok(DnsProtocol::Tcp { addr });
        }
        if let Some(rest) = s.strip_prefix("tls://") {
            let addr = parse_upstream_addr(rest, Some(DEFAULT_DOT_PORT))?;
            let hostname = host_of(&addr, rest);
            return Ok(DnsProtocol::Tls { addr, hostname });
        }
        if let Some(rest) = s.strip_prefix("https://") {
            let authority = rest.split('/').next().unwrap_or_default();
            if authority.is_empty() {
                return Err(format!("invalid url {}: missing host", s));
            }
            let addr = parse_upstream_addr(authority, Some(DEFAULT_DOH_PORT))?;
            let hostname = host_of(&addr, authority);
            return Ok(DnsProtocol::Https {
                url: s.into(),
                hostname,
                addr,
            });
        }
        if let Some((scheme, _)) = s.split_once("://") {
            return Err(format!("unsupported url scheme {}", scheme));
        }

        let addr = parse_upstream_addr(s, default_port)?;
        Ok(DnsProtocol::Udp { addr })
    }

    pub fn addr(&self) -> &UpstreamAddr {
        match self {
            DnsProtocol::Udp { addr }
            | DnsProtocol::Tcp { addr }
            | DnsProtocol::Tls { addr, .. }
            | DnsProtocol::Https { addr, .. } => addr,
        }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.addr().socket_addr()
    }

    pub fn hostname(&self) -> Option<&str> {
        match self {
            DnsProtocol::Tls { hostname, .. } | DnsProtocol::Https { hostname, .. } => {
                Some(hostname)
            }
            _ => None,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            DnsProtocol::Udp { .. } => "UDP",
            DnsProtocol::Tcp { .. } => "TCP",
            DnsProtocol::Tls { .. } => "TLS",
            DnsProtocol::Https { .. } => "HTTPS",
        }
    }

    /// Returns `true` if this protocol has an unresolved hostname that needs bootstrapping.
    pub fn needs_resolution(&self) -> bool {
        self.addr().is_unresolved()
    }

    /// Creates a copy of this protocol pinned to the given resolved `SocketAddr`.
    /// TLS and HTTPS keep their hostname for SNI and certificate checks.
    pub fn with_resolved_addr(&self, resolved: SocketAddr) -> Self {
        let addr = UpstreamAddr::Resolved(resolved);
        match self {
            DnsProtocol::Udp { .. } => DnsProtocol::Udp { addr },
            DnsProtocol::Tcp { .. } => DnsProtocol::Tcp { addr },
            DnsProtocol::Tls { hostname, .. } => DnsProtocol::Tls {
                addr,
                hostname: hostname.clone(),
            },
            DnsProtocol::Https { url, hostname, .. } => DnsProtocol::Https {
                url: url.clone(),
                hostname: hostname.clone(),
                addr,
            },
        }
    }
}

fn host_of(addr: &UpstreamAddr, authority: &str) -> Arc<str> {
    match addr {
        UpstreamAddr::Unresolved { hostname, .. } => hostname.clone(),
        UpstreamAddr::Resolved(sock) => match split_host(authority) {
            Some(host) => host.into(),
            None => sock.ip().to_string().into(),
        },
    }
}

fn split_host(authority: &str) -> Option<&str> {
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split(']').next();
    }
    authority.split(':').next()
}

/// Splits `host:port`, `[v6]:port`, bare IPs and bare hostnames.
fn parse_upstream_addr(s: &str, default_port: Option<u16>) -> Result<UpstreamAddr, String> {
    if s.is_empty() {
        return Err(MISSING_PORT.to_string());
    }
    if let Ok(addr) = s.parse::<SocketAddr>() {
        if addr.port() == 0 {
            return Err(format!("invalid port {}", addr.port()));
        }
        return Ok(UpstreamAddr::Resolved(addr));
    }
    if let Ok(ip) = s.parse::<IpAddr>() {
        let port = default_port.ok_or_else(|| MISSING_PORT.to_string())?;
        return Ok(UpstreamAddr::Resolved(SocketAddr::new(ip, port)));
    }

    let (host, port) = if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| "missing ']' in address".to_string())?;
        match tail.strip_prefix(':') {
            Some(port) => (host, parse_port(port)?),
            None if tail.is_empty() => {
                (host, default_port.ok_or_else(|| MISSING_PORT.to_string())?)
            }
            None => return Err(format!("unexpected {} after address", tail)),
        }
    } else {
        match s.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => {
                return Err("too many colons in address".to_string())
            }
            Some((host, port)) => (host, parse_port(port)?),
            None => (s, default_port.ok_or_else(|| MISSING_PORT.to_string())?),
        }
    };

    if host.is_empty() {
        return Err("missing host in address".to_string());
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(UpstreamAddr::Resolved(SocketAddr::new(ip, port)));
    }
    if !is_valid_hostname(host) {
        return Err(format!("invalid hostname {}", host));
    }
    Ok(UpstreamAddr::Unresolved {
        hostname: host.into(),
        port,
    })
}

fn parse_port(port: &str) -> Result<u16, String> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("invalid port {}", port)),
        Ok(port) => Ok(port),
    }
}

fn is_valid_hostname(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

impl FromStr for DnsProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default_port(s, None)
    }
}

impl fmt::Display for DnsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsProtocol::Udp { addr } => write!(f, "udp://{}", addr),
            DnsProtocol::Tcp { addr } => write!(f, "tcp://{}", addr),
            DnsProtocol::Tls { addr, hostname } => {
                write!(f, "tls://{}:{}", hostname, addr.port())
            }
            DnsProtocol::Https { url, .. } => write!(f, "{}", url),
        }
    }
}
