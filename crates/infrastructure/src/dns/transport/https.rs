//! DNS-over-HTTPS transport (RFC 8484): raw wire messages POSTed as
//! `application/dns-message`.

use super::{timeout_error, DnsTransport, TransportResponse};
use async_trait::async_trait;
use dnsforward_domain::DomainError;
use std::net::{IpAddr, SocketAddr};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

static SHARED_CLIENT: LazyLock<reqwest::Client> =
    LazyLock::new(|| client_builder().build().unwrap_or_else(|_| reqwest::Client::new()));

fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(4)
}

pub struct HttpsTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpsTransport {
    /// `pinned` is the bootstrapped address of `hostname`. When present the
    /// transport gets its own client that connects there instead of asking
    /// the system resolver.
    pub fn new(
        url: String,
        hostname: &str,
        pinned: Option<SocketAddr>,
    ) -> Result<Self, DomainError> {
        let client = match pinned {
            Some(addr) if hostname.parse::<IpAddr>().is_err() => client_builder()
                .resolve(hostname, addr)
                .build()
                .map_err(|e| DomainError::Transport {
                    server: url.clone(),
                    reason: format!("building HTTPS client: {}", e),
                })?,
            _ => SHARED_CLIENT.clone(),
        };
        Ok(Self { url, client })
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, DNS_MESSAGE_CONTENT_TYPE)
            .body(message_bytes.to_vec())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Transport {
                server: self.url.clone(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let body: bytes::Bytes = response.bytes().await.map_err(|e| self.request_error(e))?;
        Ok(body.to_vec())
    }

    fn request_error(&self, e: reqwest::Error) -> DomainError {
        if e.is_timeout() {
            timeout_error(&self.url)
        } else if e.is_connect() {
            DomainError::TransportConnectionRefused {
                server: self.url.clone(),
            }
        } else {
            DomainError::Transport {
                server: self.url.clone(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        debug!(url = %self.url, message_len = message_bytes.len(), "Sending DoH query");

        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| timeout_error(&self.url))??;

        debug!(url = %self.url, response_len = bytes.len(), "DoH response received");
        Ok(TransportResponse {
            bytes,
            protocol_used: "HTTPS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "HTTPS"
    }
}
