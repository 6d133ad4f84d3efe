use super::upstream::remaining;
use dnsforward_application::ports::{DnsUpstream, QueryOptions, UpstreamAnswer};
use dnsforward_domain::{DnsQuery, DomainError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Tries upstreams one at a time in configured order.
///
/// Each attempt is bounded by an even share of what is left of the deadline
/// across the upstreams not yet tried.
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        Self
    }

    pub async fn query_refs(
        &self,
        upstreams: &[Arc<dyn DnsUpstream>],
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Result<UpstreamAnswer, DomainError> {
        if upstreams.is_empty() {
            return Err(DomainError::TransportNoHealthyServers);
        }
        debug!(strategy = "sequential", servers = upstreams.len(), domain = %query.domain, "Trying sequentially");

        for (position, upstream) in upstreams.iter().enumerate() {
            let left = remaining(deadline);
            if left.is_zero() {
                return Err(DomainError::QueryTimeout);
            }
            let timeout = attempt_budget(left, upstreams.len() - position);

            let start = Instant::now();
            match upstream.exchange(query, options, timeout).await {
                Ok(answer) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    debug!(server = %upstream.address(), latency_ms, position, "Server responded");
                    return Ok(UpstreamAnswer {
                        answer,
                        server: Arc::from(upstream.address()),
                        latency_ms,
                    });
                }
                Err(e) => {
                    warn!(server = %upstream.address(), error = %e, position, "Failing over");
                }
            }
        }
        Err(DomainError::TransportAllServersUnreachable)
    }
}

fn attempt_budget(left: Duration, untried: usize) -> Duration {
    let untried = u32::try_from(untried).unwrap_or(u32::MAX).max(1);
    left / untried
}

impl Default for SequentialStrategy {
    fn default() -> Self {
        Self::new()
    }
}
