use super::runtime_config::RuntimeSnapshot;
use async_trait::async_trait;
use dnsforward_domain::DomainError;
use std::net::IpAddr;

#[async_trait]
pub trait HostnameResolver: Send + Sync {
    /// `Ok(None)` when the upstream has no PTR record for `ip`;
    /// `Err` only for transport failures and timeouts.
    async fn resolve_hostname(
        &self,
        ip: IpAddr,
        snapshot: &RuntimeSnapshot,
    ) -> Result<Option<String>, DomainError>;
}
