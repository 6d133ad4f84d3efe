use super::fastest::FastestAddrStrategy;
use super::parallel::ParallelStrategy;
use super::prober::AddressProber;
use super::sequential::SequentialStrategy;
use dnsforward_application::ports::{DnsUpstream, QueryOptions, UpstreamAnswer};
use dnsforward_domain::{DnsQuery, DomainError, UpstreamMode};
use std::sync::Arc;
use tokio::time::Instant;

/// Enum dispatch over the upstream modes.
pub enum Strategy {
    Sequential(SequentialStrategy),
    Parallel(ParallelStrategy),
    FastestAddr(FastestAddrStrategy),
}

impl Strategy {
    pub fn from_mode(mode: UpstreamMode, prober: Arc<dyn AddressProber>) -> Self {
        match mode {
            UpstreamMode::Sequential => Self::Sequential(SequentialStrategy::new()),
            UpstreamMode::Parallel => Self::Parallel(ParallelStrategy::new()),
            UpstreamMode::FastestAddr => Self::FastestAddr(FastestAddrStrategy::new(prober)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential(_) => "sequential",
            Self::Parallel(_) => "parallel",
            Self::FastestAddr(_) => "fastest_addr",
        }
    }

    pub async fn query_refs(
        &self,
        upstreams: &[Arc<dyn DnsUpstream>],
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Result<UpstreamAnswer, DomainError> {
        match self {
            Self::Sequential(s) => s.query_refs(upstreams, query, options, deadline).await,
            Self::Parallel(s) => s.query_refs(upstreams, query, options, deadline).await,
            Self::FastestAddr(s) => s.query_refs(upstreams, query, options, deadline).await,
        }
    }
}
