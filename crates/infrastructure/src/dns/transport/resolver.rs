use super::timeout_error;
use dnsforward_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;

/// Resolves `hostname` with the system resolver, used when no bootstrap
/// servers are configured.
pub async fn resolve_all(
    hostname: &str,
    port: u16,
    timeout: Duration,
) -> Result<Vec<SocketAddr>, DomainError> {
    let target = format!("{}:{}", hostname, port);

    let addrs: Vec<SocketAddr> = tokio::time::timeout(timeout, tokio::net::lookup_host(&target))
        .await
        .map_err(|_| timeout_error(&target))?
        .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", hostname, e)))?
        .collect();

    if addrs.is_empty() {
        return Err(DomainError::InvalidDomainName(format!(
            "no addresses found for {}",
            hostname
        )));
    }
    Ok(addrs)
}
