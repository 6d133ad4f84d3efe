use async_trait::async_trait;
use dnsforward_domain::{ClientSubnet, DnsAnswer, DnsQuery, DomainError};
use std::time::Duration;

/// EDNS settings attached to a forwarded query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Set the DO bit.
    pub dnssec_ok: bool,
    /// Send an EDNS Client Subnet option.
    pub client_subnet: Option<ClientSubnet>,
}

/// A single upstream resolver. Implementations pick their transport when they
/// are built; callers only see the exchange.
#[async_trait]
pub trait DnsUpstream: Send + Sync {
    async fn exchange(
        &self,
        query: &DnsQuery,
        options: &QueryOptions,
        timeout: Duration,
    ) -> Result<DnsAnswer, DomainError>;

    /// Address as configured, used in logs and query outcomes.
    fn address(&self) -> &str;
}
