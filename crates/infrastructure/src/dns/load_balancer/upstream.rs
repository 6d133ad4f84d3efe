use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use crate::dns::transport::{self, tcp::TcpTransport, DnsTransport, Transport};
use async_trait::async_trait;
use dnsforward_application::ports::{DnsUpstream, QueryOptions};
use dnsforward_domain::{DnsAnswer, DnsProtocol, DnsQuery, DomainError, ResponseCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// One configured upstream with its transport.
pub struct UpstreamResolver {
    protocol: DnsProtocol,
    transport: Transport,
    display: Arc<str>,
}

impl UpstreamResolver {
    /// `protocol` must already carry a resolved address.
    pub fn new(protocol: DnsProtocol) -> Result<Self, DomainError> {
        let transport = transport::create_transport(&protocol)?;
        let display = Arc::from(protocol.to_string());
        Ok(Self {
            protocol,
            transport,
            display,
        })
    }

    async fn retry_over_tcp(
        &self,
        query_bytes: &[u8],
        id: u16,
        deadline: Instant,
    ) -> Result<DnsAnswer, DomainError> {
        let Some(addr) = self.protocol.socket_addr() else {
            return Err(DomainError::InvalidDnsResponse(
                "truncated response".to_string(),
            ));
        };
        debug!(server = %addr, "Response truncated (TC bit), retrying via TCP");

        let tcp = TcpTransport::new(addr);
        let response = DnsTransport::send(&tcp, query_bytes, remaining(deadline)).await?;
        let parsed = ResponseParser::parse(&response.bytes)?;
        check_id(&self.display, id, parsed.id)?;
        Ok(parsed.answer)
    }
}

#[async_trait]
impl DnsUpstream for UpstreamResolver {
    async fn exchange(
        &self,
        query: &DnsQuery,
        options: &QueryOptions,
        timeout: Duration,
    ) -> Result<DnsAnswer, DomainError> {
        let deadline = Instant::now() + timeout;
        let built = MessageBuilder::build_query(query, options)?;

        let response = self.transport.send(&built.bytes, timeout).await?;
        let parsed = ResponseParser::parse(&response.bytes)?;
        check_id(&self.display, built.id, parsed.id)?;

        let answer = if parsed.truncated && matches!(self.protocol, DnsProtocol::Udp { .. }) {
            self.retry_over_tcp(&built.bytes, built.id, deadline).await?
        } else {
            parsed.answer
        };

        if matches!(answer.rcode, ResponseCode::ServFail | ResponseCode::Refused) {
            return Err(DomainError::UpstreamRcode {
                server: self.display.to_string(),
                rcode: answer.rcode.to_string(),
            });
        }
        Ok(answer)
    }

    fn address(&self) -> &str {
        &self.display
    }
}

fn check_id(server: &str, expected: u16, received: u16) -> Result<(), DomainError> {
    if expected == received {
        Ok(())
    } else {
        Err(DomainError::InvalidDnsResponse(format!(
            "{} answered with ID {} instead of {}",
            server, received, expected
        )))
    }
}

pub(crate) fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
