use super::dns_upstream::QueryOptions;
use async_trait::async_trait;
use dnsforward_domain::{DnsAnswer, DnsQuery, DomainError};
use std::sync::Arc;
use tokio::time::Instant;

/// Answer chosen by a forwarder, with the upstream that produced it.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    pub answer: DnsAnswer,
    pub server: Arc<str>,
    pub latency_ms: u64,
}

/// A set of upstreams queried according to an upstream mode.
#[async_trait]
pub trait DnsForwarder: Send + Sync {
    /// Resolves `query`, giving up at `deadline`.
    async fn forward(
        &self,
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Result<UpstreamAnswer, DomainError>;
}
