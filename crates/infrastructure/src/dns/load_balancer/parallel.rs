use super::upstream::remaining;
use dnsforward_application::ports::{DnsUpstream, QueryOptions, UpstreamAnswer};
use dnsforward_domain::{DnsAnswer, DnsQuery, DomainError};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of one upstream task in a race.
pub(crate) struct RaceResult {
    pub server: Arc<str>,
    pub latency_ms: u64,
    pub result: Result<DnsAnswer, DomainError>,
}

/// Aborts every racing task when dropped, including when the caller's
/// deadline fires first.
pub(crate) struct RaceGuard(Vec<AbortHandle>);

impl Drop for RaceGuard {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Spawns one exchange per upstream.
pub(crate) fn spawn_race(
    upstreams: &[Arc<dyn DnsUpstream>],
    query: &DnsQuery,
    options: &QueryOptions,
    deadline: Instant,
) -> (FuturesUnordered<JoinHandle<RaceResult>>, RaceGuard) {
    let mut abort_handles = Vec::with_capacity(upstreams.len());
    let futs = FuturesUnordered::new();

    for upstream in upstreams {
        let upstream = Arc::clone(upstream);
        let query = query.clone();
        let options = *options;
        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let result = upstream
                .exchange(&query, &options, remaining(deadline))
                .await;
            RaceResult {
                server: Arc::from(upstream.address()),
                latency_ms: start.elapsed().as_millis() as u64,
                result,
            }
        });
        abort_handles.push(handle.abort_handle());
        futs.push(handle);
    }

    (futs, RaceGuard(abort_handles))
}

/// Sends the query to every upstream at once and keeps the first success.
/// Losing answers are discarded, never returned or cached.
pub struct ParallelStrategy;

impl ParallelStrategy {
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
        debug!(strategy = "parallel", servers = upstreams.len(), domain = %query.domain, "Racing all upstreams");

        let (mut futs, _guard) = spawn_race(upstreams, query, options, deadline);

        let race = async {
            while let Some(joined) = futs.next().await {
                match joined {
                    Ok(RaceResult {
                        server,
                        latency_ms,
                        result: Ok(answer),
                    }) => {
                        debug!(server = %server, latency_ms, "Fastest response");
                        return Ok(UpstreamAnswer {
                            answer,
                            server,
                            latency_ms,
                        });
                    }
                    Ok(RaceResult {
                        server,
                        result: Err(e),
                        ..
                    }) => {
                        debug!(server = %server, error = %e, "Server failed");
                    }
                    Err(e) => {
                        warn!(error = %e, "Upstream task panicked");
                    }
                }
            }
            Err(DomainError::TransportAllServersUnreachable)
        };

        tokio::time::timeout_at(deadline, race)
            .await
            .unwrap_or(Err(DomainError::QueryTimeout))
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new()
    }
}
