use async_trait::async_trait;
use dnsforward_application::ports::{HostnameResolver, QueryOptions, RuntimeSnapshot};
use dnsforward_domain::{DnsQuery, DomainError, RecordType};
use std::fmt::Write;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_PTR_TIMEOUT: Duration = Duration::from_secs(2);

/// Turns client addresses into hostnames with PTR queries.
///
/// Queries go to the snapshot's private PTR upstreams, or to the main
/// upstreams when none are configured.
pub struct ReverseResolver {
    timeout: Duration,
}

impl ReverseResolver {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PTR_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn ip_to_reverse_domain(ip: &IpAddr) -> String {
        match ip {
            IpAddr::V4(ipv4) => {
                let [a, b, c, d] = ipv4.octets();
                format!("{}.{}.{}.{}.in-addr.arpa", d, c, b, a)
            }
            IpAddr::V6(ipv6) => {
                let mut name = String::with_capacity(72);
                for byte in ipv6.octets().iter().rev() {
                    let _ = write!(name, "{:x}.{:x}.", byte & 0x0f, byte >> 4);
                }
                name.push_str("ip6.arpa");
                name
            }
        }
    }

    /// PTR target of `ip`, `Ok(None)` when the upstream has no record.
    pub async fn lookup(
        &self,
        ip: IpAddr,
        snapshot: &RuntimeSnapshot,
    ) -> Result<Option<String>, DomainError> {
        let reverse_domain = Self::ip_to_reverse_domain(&ip);
        debug!(ip = %ip, reverse_domain = %reverse_domain, "Performing PTR lookup");

        let query = DnsQuery::new(reverse_domain, RecordType::PTR);
        let deadline = Instant::now() + self.timeout;
        let result = snapshot
            .ptr_upstreams()
            .forward(&query, &QueryOptions::default(), deadline)
            .await
            .inspect_err(|e| debug!(ip = %ip, error = %e, "PTR lookup failed"))?;

        let hostname = result
            .answer
            .ptr_target()
            .filter(|target| !target.is_empty())
            .map(str::to_string);
        match &hostname {
            Some(hostname) => {
                debug!(ip = %ip, hostname = %hostname, server = %result.server, "PTR lookup successful")
            }
            None => debug!(ip = %ip, server = %result.server, "PTR lookup returned no records"),
        }
        Ok(hostname)
    }
}

impl Default for ReverseResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostnameResolver for ReverseResolver {
    async fn resolve_hostname(
        &self,
        ip: IpAddr,
        snapshot: &RuntimeSnapshot,
    ) -> Result<Option<String>, DomainError> {
        self.lookup(ip, snapshot).await
    }
}
