use super::upstream::UpstreamResolver;
use crate::dns::transport::resolver;
use dnsforward_application::ports::{DnsUpstream, QueryOptions};
use dnsforward_domain::config::parse_bootstrap;
use dnsforward_domain::{DnsQuery, DomainError, RecordType, ValidationError};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves upstream hostnames. Uses the configured bootstrap servers in
/// order, or the system resolver when there are none.
pub struct Bootstrap {
    servers: Vec<UpstreamResolver>,
    timeout: Duration,
}

impl Bootstrap {
    pub fn from_config(entries: &[String], timeout: Duration) -> Result<Self, ValidationError> {
        let servers = entries
            .iter()
            .map(|entry| {
                let protocol = parse_bootstrap(entry)?;
                UpstreamResolver::new(protocol).map_err(|e| ValidationError::InvalidBootstrap {
                    address: entry.clone(),
                    cause: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { servers, timeout })
    }

    /// First address of `hostname`, IPv4 preferred.
    pub async fn resolve(&self, hostname: &str) -> Result<IpAddr, DomainError> {
        if self.servers.is_empty() {
            let addrs = resolver::resolve_all(hostname, 0, self.timeout).await?;
            return addrs
                .iter()
                .find(|addr| addr.is_ipv4())
                .or_else(|| addrs.first())
                .map(|addr| addr.ip())
                .ok_or_else(|| no_addresses(hostname));
        }

        let mut last_error = no_addresses(hostname);
        for record_type in [RecordType::A, RecordType::AAAA] {
            let query = DnsQuery::new(hostname, record_type);
            for server in &self.servers {
                match server
                    .exchange(&query, &QueryOptions::default(), self.timeout)
                    .await
                {
                    Ok(answer) => {
                        if let Some(ip) = answer.addresses().next() {
                            debug!(hostname, address = %ip, bootstrap = %server.address(), "Hostname bootstrapped");
                            return Ok(ip);
                        }
                    }
                    Err(e) => {
                        debug!(hostname, bootstrap = %server.address(), error = %e, "Bootstrap server failed");
                        last_error = e;
                    }
                }
            }
        }
        Err(last_error)
    }
}

fn no_addresses(hostname: &str) -> DomainError {
    DomainError::InvalidDomainName(format!("no addresses found for {}", hostname))
}
