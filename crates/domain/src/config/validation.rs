use super::blocking::BlockingMode;
use super::dns::DnsConfig;
use super::errors::ValidationError;
use super::patch::ConfigCandidate;
use super::upstream::{parse_bootstrap, UpstreamMode, UpstreamSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Checks a candidate and turns it into a publishable configuration.
///
/// Checks run in a fixed order and stop at the first failure, so the same
/// bad input always yields the same message:
/// upstream syntax, bootstrap addresses, blocking mode, upstream mode,
/// cache TTL range, rate limit.
pub fn validate(candidate: &ConfigCandidate) -> Result<DnsConfig, ValidationError> {
    UpstreamSet::parse(&candidate.upstream_dns)?;
    UpstreamSet::parse_private(&candidate.local_ptr_upstreams)?;

    for address in &candidate.bootstrap_dns {
        parse_bootstrap(address)?;
    }

    let blocking_mode = BlockingMode::from_str(&candidate.blocking_mode)?;
    let blocking_ipv4 = parse_blocking_addr::<Ipv4Addr>(&candidate.blocking_ipv4)?;
    let blocking_ipv6 = parse_blocking_addr::<Ipv6Addr>(&candidate.blocking_ipv6)?;
    if blocking_mode == BlockingMode::CustomIp
        && (blocking_ipv4.is_none() || blocking_ipv6.is_none())
    {
        return Err(ValidationError::InvalidBlockingMode);
    }

    let upstream_mode = UpstreamMode::from_str(&candidate.upstream_mode)?;

    if candidate.cache_ttl_min > candidate.cache_ttl_max {
        return Err(ValidationError::InvalidCacheTtlRange);
    }

    let ratelimit =
        u32::try_from(candidate.ratelimit).map_err(|_| ValidationError::InvalidRateLimit)?;

    Ok(DnsConfig {
        upstream_dns: candidate.upstream_dns.clone(),
        upstream_dns_file: candidate.upstream_dns_file.clone(),
        bootstrap_dns: candidate.bootstrap_dns.clone(),
        protection_enabled: candidate.protection_enabled,
        ratelimit,
        blocking_mode,
        blocking_ipv4,
        blocking_ipv6,
        edns_cs_enabled: candidate.edns_cs_enabled,
        dnssec_enabled: candidate.dnssec_enabled,
        disable_ipv6: candidate.disable_ipv6,
        upstream_mode,
        cache_size: candidate.cache_size,
        cache_ttl_min: candidate.cache_ttl_min,
        cache_ttl_max: candidate.cache_ttl_max,
        resolve_clients: candidate.resolve_clients,
        local_ptr_upstreams: candidate.local_ptr_upstreams.clone(),
    })
}

fn parse_blocking_addr<T: FromStr>(raw: &str) -> Result<Option<T>, ValidationError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ValidationError::InvalidBlockingMode)
}
