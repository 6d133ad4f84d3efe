use crate::ports::{
    AllowAllFilter, CacheKey, FilterDecision, QueryCachePort, QueryFilter, QueryOptions,
    RuntimeConfigPort,
};
use crate::services::{BlockingSynthesizer, RateLimiter};
use crate::use_cases::clients::ResolveClientNameUseCase;
use dnsforward_domain::{ClientSubnet, DnsAnswer, DnsRequest, RecordType, ResponseCode};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Overall time budget of one query when none is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Path a query took through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    RateLimited,
    Ipv6Disabled,
    Blocked,
    Rewritten,
    CacheHit,
    Forwarded,
    /// Every upstream failed; answered with SERVFAIL.
    Failed,
}

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: DnsAnswer,
    pub resolution: Resolution,
    /// Upstream that produced a forwarded answer.
    pub upstream: Option<Arc<str>>,
    /// Generation of the configuration snapshot the query ran under.
    pub generation: u64,
}

/// Resolution engine: rate limit, cache, filter, forward, in that order.
///
/// Each query reads one configuration snapshot at the start and uses it to
/// the end, so a concurrent configuration change never mixes two versions.
/// The engine always produces an answer; failures become SERVFAIL or REFUSED.
pub struct HandleDnsQueryUseCase {
    runtime: Arc<dyn RuntimeConfigPort>,
    cache: Arc<dyn QueryCachePort>,
    rate_limiter: Arc<RateLimiter>,
    filter: Arc<dyn QueryFilter>,
    synthesizer: BlockingSynthesizer,
    client_names: Option<Arc<ResolveClientNameUseCase>>,
    query_timeout: Duration,
}

impl HandleDnsQueryUseCase {
    pub fn new(
        runtime: Arc<dyn RuntimeConfigPort>,
        cache: Arc<dyn QueryCachePort>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            runtime,
            cache,
            rate_limiter,
            filter: Arc::new(AllowAllFilter),
            synthesizer: BlockingSynthesizer::new(),
            client_names: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn QueryFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_client_names(mut self, client_names: Arc<ResolveClientNameUseCase>) -> Self {
        self.client_names = Some(client_names);
        self
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub async fn execute(&self, request: &DnsRequest) -> QueryOutcome {
        let start = Instant::now();
        let snapshot = self.runtime.snapshot();
        let config = &snapshot.config;
        let query = &request.query;
        let client_ip = request.client_ip;

        let outcome = |answer: DnsAnswer, resolution: Resolution| QueryOutcome {
            answer,
            resolution,
            upstream: None,
            generation: snapshot.generation,
        };

        if config.resolve_clients {
            if let Some(client_names) = &self.client_names {
                client_names.trigger(client_ip, Arc::clone(&snapshot));
            }
        }

        if !self.rate_limiter.allow(client_ip, config.ratelimit, start) {
            debug!(client = %client_ip, domain = %query.domain, "Rate limited");
            return outcome(DnsAnswer::refused(), Resolution::RateLimited);
        }

        if config.disable_ipv6 && query.record_type == RecordType::AAAA {
            return outcome(DnsAnswer::empty(ResponseCode::NoError), Resolution::Ipv6Disabled);
        }

        let subnet = if config.edns_cs_enabled {
            ClientSubnet::from_client_ip(client_ip)
                .inspect_err(|e| debug!(error = %e, client = %client_ip, "No client subnet"))
                .ok()
        } else {
            None
        };
        let key = CacheKey::new(query, subnet);
        let cached = if config.cache_size > 0 {
            self.cache.lookup(&key, unix_now_secs())
        } else {
            None
        };

        if config.protection_enabled {
            match self.filter.decide(query, client_ip) {
                FilterDecision::Allow => {}
                FilterDecision::Block => {
                    debug!(client = %client_ip, domain = %query.domain, "Blocked");
                    let answer = self.synthesizer.synthesize_for(query, config);
                    return outcome(answer, Resolution::Blocked);
                }
                FilterDecision::Rewrite(answer) => {
                    debug!(client = %client_ip, domain = %query.domain, "Rewritten");
                    return outcome(answer, Resolution::Rewritten);
                }
            }
        }

        if let Some(answer) = cached {
            debug!(domain = %query.domain, record_type = %query.record_type, "Cache hit");
            return outcome(answer, Resolution::CacheHit);
        }

        let options = QueryOptions {
            dnssec_ok: config.dnssec_enabled,
            client_subnet: subnet,
        };
        let deadline = start + self.query_timeout;

        match snapshot.upstreams.forward(query, &options, deadline).await {
            Ok(result) => {
                if config.cache_size > 0 {
                    if let Some(ttl) = cacheable_ttl(&result.answer) {
                        self.cache
                            .store(key, &result.answer, ttl, config, unix_now_secs());
                    }
                }
                debug!(
                    domain = %query.domain,
                    record_type = %query.record_type,
                    server = %result.server,
                    rcode = %result.answer.rcode,
                    latency_ms = result.latency_ms,
                    "Query forwarded"
                );
                QueryOutcome {
                    answer: result.answer,
                    resolution: Resolution::Forwarded,
                    upstream: Some(result.server),
                    generation: snapshot.generation,
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    domain = %query.domain,
                    record_type = %query.record_type,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "All upstreams failed"
                );
                outcome(DnsAnswer::servfail(), Resolution::Failed)
            }
        }
    }
}

/// TTL to cache a forwarded answer for, or `None` if it must not be cached.
/// Positive answers use their smallest record TTL, NXDOMAIN the SOA minimum.
fn cacheable_ttl(answer: &DnsAnswer) -> Option<u32> {
    match answer.rcode {
        ResponseCode::NoError if !answer.answers.is_empty() => answer.min_ttl(),
        ResponseCode::NXDomain => Some(answer.negative_ttl.unwrap_or(0)),
        _ => None,
    }
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
