use async_trait::async_trait;
use smallvec::SmallVec;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// Ports tried, in order, when probing an address.
pub const DEFAULT_PROBE_PORTS: [u16; 2] = [80, 443];

/// Measures how quickly an address answers.
#[async_trait]
pub trait AddressProber: Send + Sync {
    /// Time to reach `ip`, or `None` if it did not respond within `timeout`.
    async fn probe(&self, ip: IpAddr, timeout: Duration) -> Option<Duration>;
}

/// Probes with a TCP connect, trying each port until one accepts.
pub struct TcpProber {
    ports: SmallVec<[u16; 2]>,
}

impl TcpProber {
    pub fn new() -> Self {
        Self::with_ports(&DEFAULT_PROBE_PORTS)
    }

    pub fn with_ports(ports: &[u16]) -> Self {
        Self {
            ports: SmallVec::from_slice(ports),
        }
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressProber for TcpProber {
    async fn probe(&self, ip: IpAddr, timeout: Duration) -> Option<Duration> {
        let start = Instant::now();
        let deadline = start + timeout;

        for &port in &self.ports {
            let addr = SocketAddr::new(ip, port);
            match tokio::time::timeout_at(deadline, TcpStream::connect(addr)).await {
                Ok(Ok(_)) => return Some(start.elapsed()),
                Ok(Err(e)) => debug!(addr = %addr, error = %e, "Probe failed"),
                Err(_) => return None,
            }
        }
        None
    }
}
