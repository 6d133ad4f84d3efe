use super::dns_forwarder::DnsForwarder;
use async_trait::async_trait;
use dnsforward_domain::{ConfigCandidate, ConfigError, DnsConfig, DnsConfigPatch};
use std::sync::Arc;

/// Everything a query needs from the configuration, published as one
/// immutable unit. Readers keep the `Arc` for the whole query.
pub struct RuntimeSnapshot {
    pub config: Arc<DnsConfig>,
    /// Built from `upstream_dns` following `upstream_mode`.
    pub upstreams: Arc<dyn DnsForwarder>,
    /// Built from `local_ptr_upstreams`; `None` when that list is empty.
    pub private_upstreams: Option<Arc<dyn DnsForwarder>>,
    /// Increases by one on every successful apply.
    pub generation: u64,
}

impl RuntimeSnapshot {
    /// Forwarder used for reverse lookups of client addresses.
    pub fn ptr_upstreams(&self) -> &Arc<dyn DnsForwarder> {
        self.private_upstreams.as_ref().unwrap_or(&self.upstreams)
    }
}

#[async_trait]
pub trait RuntimeConfigPort: Send + Sync {
    fn snapshot(&self) -> Arc<RuntimeSnapshot>;

    /// Validates `candidate`, builds its upstreams and publishes it.
    /// On error the published snapshot is left untouched.
    async fn apply(&self, candidate: ConfigCandidate) -> Result<Arc<RuntimeSnapshot>, ConfigError>;

    /// Overlays `patch` on the published configuration and applies the result.
    /// Concurrent updates are not lost: a patch computed against a snapshot
    /// that was replaced meanwhile is recomputed.
    async fn update(&self, patch: DnsConfigPatch) -> Result<Arc<RuntimeSnapshot>, ConfigError>;
}
