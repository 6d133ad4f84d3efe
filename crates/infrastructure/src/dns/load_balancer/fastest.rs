use super::parallel::{spawn_race, ParallelStrategy, RaceResult};
use super::prober::AddressProber;
use super::upstream::remaining;
use dnsforward_application::ports::{DnsUpstream, QueryOptions, UpstreamAnswer};
use dnsforward_domain::{DnsQuery, DomainError};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use smallvec::SmallVec;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Upper bound on the probing phase, so a silent network still leaves time
/// to return the fallback answer.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Queries every upstream, probes the addresses they return and keeps the
/// answer holding the address that responded first.
///
/// Non-address queries have nothing to probe and behave like the parallel
/// strategy. When no address answers the probe, the first successful
/// upstream answer is returned as is.
pub struct FastestAddrStrategy {
    prober: Arc<dyn AddressProber>,
    parallel: ParallelStrategy,
}

impl FastestAddrStrategy {
    pub fn new(prober: Arc<dyn AddressProber>) -> Self {
        Self {
            prober,
            parallel: ParallelStrategy::new(),
        }
    }

    pub async fn query_refs(
        &self,
        upstreams: &[Arc<dyn DnsUpstream>],
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Result<UpstreamAnswer, DomainError> {
        if !query.record_type.is_address() {
            return self
                .parallel
                .query_refs(upstreams, query, options, deadline)
                .await;
        }
        if upstreams.is_empty() {
            return Err(DomainError::TransportNoHealthyServers);
        }
        debug!(strategy = "fastest_addr", servers = upstreams.len(), domain = %query.domain, "Collecting answers");

        let answers = Self::collect_answers(upstreams, query, options, deadline).await;
        if answers.is_empty() {
            return Err(DomainError::TransportAllServersUnreachable);
        }

        let mut candidates: SmallVec<[(IpAddr, usize); 8]> = SmallVec::new();
        for (index, answer) in answers.iter().enumerate() {
            for ip in answer.answer.addresses() {
                if !candidates.iter().any(|(seen, _)| *seen == ip) {
                    candidates.push((ip, index));
                }
            }
        }

        let winner = self.fastest_candidate(&candidates, deadline).await;
        let index = winner.map_or(0, |(_, index)| index);
        if let Some((ip, _)) = winner {
            debug!(address = %ip, server = %answers[index].server, "Fastest address selected");
        }

        answers
            .into_iter()
            .nth(index)
            .ok_or(DomainError::TransportAllServersUnreachable)
    }

    async fn collect_answers(
        upstreams: &[Arc<dyn DnsUpstream>],
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Vec<UpstreamAnswer> {
        let (mut futs, _guard) = spawn_race(upstreams, query, options, deadline);
        let mut answers = Vec::with_capacity(upstreams.len());

        while let Ok(Some(joined)) = tokio::time::timeout_at(deadline, futs.next()).await {
            match joined {
                Ok(RaceResult {
                    server,
                    latency_ms,
                    result: Ok(answer),
                }) => answers.push(UpstreamAnswer {
                    answer,
                    server,
                    latency_ms,
                }),
                Ok(RaceResult {
                    server,
                    result: Err(e),
                    ..
                }) => debug!(server = %server, error = %e, "Server failed"),
                Err(e) => debug!(error = %e, "Upstream task failed"),
            }
        }
        answers
    }

    async fn fastest_candidate(
        &self,
        candidates: &[(IpAddr, usize)],
        deadline: Instant,
    ) -> Option<(IpAddr, usize)> {
        let timeout = remaining(deadline).min(PROBE_TIMEOUT);
        let mut probes: FuturesUnordered<_> = candidates
            .iter()
            .map(|&(ip, index)| async move {
                self.prober
                    .probe(ip, timeout)
                    .await
                    .map(|rtt| (ip, index, rtt))
            })
            .collect();

        let probe_deadline = Instant::now() + timeout;
        while let Ok(Some(probed)) = tokio::time::timeout_at(probe_deadline, probes.next()).await {
            if let Some((ip, index, rtt)) = probed {
                debug!(address = %ip, rtt_ms = rtt.as_millis() as u64, "Probe succeeded");
                return Some((ip, index));
            }
        }
        None
    }
}
