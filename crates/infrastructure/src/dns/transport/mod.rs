pub mod https;
pub mod resolver;
pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use dnsforward_domain::{DnsProtocol, DomainError};
use std::io;
use std::time::Duration;

/// Result of a raw DNS transport operation
#[derive(Debug)]
pub struct TransportResponse {
    /// Raw DNS response bytes (wire format)
    pub bytes: Vec<u8>,
    /// Which protocol was used
    pub protocol_used: &'static str,
}

/// Trait for sending raw DNS messages over the wire
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

/// Enum-dispatched transport, chosen once when the upstream is built.
pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
    #[cfg(feature = "dns-over-rustls")]
    Tls(tls::TlsTransport),
    #[cfg(feature = "dns-over-https")]
    Https(https::HttpsTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(_) => "TLS",
            #[cfg(feature = "dns-over-https")]
            Self::Https(_) => "HTTPS",
        }
    }
}

/// Creates the transport for `protocol`. Socket-based protocols need a
/// resolved address; hostnames are bootstrapped before this is called.
pub fn create_transport(protocol: &DnsProtocol) -> Result<Transport, DomainError> {
    match protocol {
        DnsProtocol::Udp { addr } => Ok(Transport::Udp(udp::UdpTransport::new(resolved(
            protocol, addr,
        )?))),
        DnsProtocol::Tcp { addr } => Ok(Transport::Tcp(tcp::TcpTransport::new(resolved(
            protocol, addr,
        )?))),

        #[cfg(feature = "dns-over-rustls")]
        DnsProtocol::Tls { addr, hostname } => Ok(Transport::Tls(tls::TlsTransport::new(
            resolved(protocol, addr)?,
            hostname.to_string(),
        ))),

        #[cfg(not(feature = "dns-over-rustls"))]
        DnsProtocol::Tls { .. } => Err(DomainError::UnsupportedProtocol(format!(
            "{} (enable the 'dns-over-rustls' feature)",
            protocol
        ))),

        #[cfg(feature = "dns-over-https")]
        DnsProtocol::Https {
            url,
            hostname,
            addr,
        } => https::HttpsTransport::new(url.to_string(), hostname, addr.socket_addr())
            .map(Transport::Https),

        #[cfg(not(feature = "dns-over-https"))]
        DnsProtocol::Https { url, .. } => Err(DomainError::UnsupportedProtocol(format!(
            "{} (enable the 'dns-over-https' feature)",
            url
        ))),
    }
}

fn resolved(
    protocol: &DnsProtocol,
    addr: &dnsforward_domain::UpstreamAddr,
) -> Result<std::net::SocketAddr, DomainError> {
    addr.socket_addr().ok_or_else(|| DomainError::Transport {
        server: protocol.to_string(),
        reason: "address is not resolved".to_string(),
    })
}

/// Maps a socket error onto the transport error variants.
pub(crate) fn io_error(server: impl ToString, e: io::Error) -> DomainError {
    let server = server.to_string();
    match e.kind() {
        io::ErrorKind::ConnectionRefused => DomainError::TransportConnectionRefused { server },
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
            DomainError::TransportConnectionReset { server }
        }
        io::ErrorKind::TimedOut => DomainError::TransportTimeout { server },
        _ => DomainError::Transport {
            server,
            reason: e.to_string(),
        },
    }
}

pub(crate) fn timeout_error(server: impl ToString) -> DomainError {
    DomainError::TransportTimeout {
        server: server.to_string(),
    }
}
