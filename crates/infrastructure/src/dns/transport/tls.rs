//! DNS-over-TLS transport (RFC 7858)
//!
//! The rustls `ClientConfig` is built once from the webpki roots and shared,
//! which also shares its session cache so repeated handshakes resume.

use super::tcp::{read_with_length_prefix, send_with_length_prefix};
use super::{io_error, timeout_error, DnsTransport, TransportResponse};
use async_trait::async_trait;
use dnsforward_domain::DomainError;
use rustls::pki_types::ServerName;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

static SHARED_TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    // reqwest brings in the ring backend too, so the process default must be explicit
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

/// DoT transport. Connects to a fixed address and presents `hostname` as SNI
/// and as the name the certificate is checked against.
pub struct TlsTransport {
    server_addr: SocketAddr,
    hostname: String,
}

impl TlsTransport {
    pub fn new(server_addr: SocketAddr, hostname: String) -> Self {
        Self {
            server_addr,
            hostname,
        }
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let connector = tokio_rustls::TlsConnector::from(Arc::clone(&SHARED_TLS_CONFIG));

        let server_name =
            ServerName::try_from(self.hostname.clone()).map_err(|e| DomainError::Transport {
                server: self.server_addr.to_string(),
                reason: format!("invalid TLS hostname '{}': {}", self.hostname, e),
            })?;

        let tcp_stream = TcpStream::connect(self.server_addr)
            .await
            .map_err(|e| io_error(self.server_addr, e))?;
        tcp_stream
            .set_nodelay(true)
            .map_err(|e| io_error(self.server_addr, e))?;

        let mut stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| DomainError::Transport {
                server: self.server_addr.to_string(),
                reason: format!("TLS handshake failed: {}", e),
            })?;
        debug!(server = %self.server_addr, hostname = %self.hostname, "TLS connection established");

        send_with_length_prefix(&mut stream, message_bytes, self.server_addr).await?;
        read_with_length_prefix(&mut stream, self.server_addr).await
    }
}

#[async_trait]
impl DnsTransport for TlsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| timeout_error(self.server_addr))??;

        debug!(server = %self.server_addr, response_len = bytes.len(), "TLS response received");
        Ok(TransportResponse {
            bytes,
            protocol_used: "TLS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }
}
