use super::bootstrap::{Bootstrap, DEFAULT_BOOTSTRAP_TIMEOUT};
use super::pool::UpstreamPool;
use super::prober::{AddressProber, TcpProber};
use super::strategy::Strategy;
use super::upstream::UpstreamResolver;
use dnsforward_application::ports::{DnsForwarder, DnsUpstream};
use dnsforward_domain::{DnsConfig, DnsProtocol, UpstreamMode, UpstreamSet, ValidationError};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Forwarders built from one configuration.
pub struct BuiltUpstreams {
    pub upstreams: Arc<dyn DnsForwarder>,
    pub private_upstreams: Option<Arc<dyn DnsForwarder>>,
}

/// Turns the upstream settings of a configuration into pools, resolving
/// hostnames through the bootstrap servers on the way.
pub struct UpstreamBuilder {
    bootstrap_timeout: Duration,
    prober: Arc<dyn AddressProber>,
}

impl UpstreamBuilder {
    pub fn new() -> Self {
        Self {
            bootstrap_timeout: DEFAULT_BOOTSTRAP_TIMEOUT,
            prober: Arc::new(TcpProber::new()),
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn AddressProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    pub async fn build(&self, config: &DnsConfig) -> Result<BuiltUpstreams, ValidationError> {
        let bootstrap = Bootstrap::from_config(&config.bootstrap_dns, self.bootstrap_timeout)?;
        let mut resolved = HashMap::new();

        let main = UpstreamSet::parse(&config.upstream_dns)?;
        let upstreams = self
            .build_pool(&main, config.upstream_mode, &bootstrap, &mut resolved)
            .await?;

        let private = UpstreamSet::parse_private(&config.local_ptr_upstreams)?;
        let private_upstreams = if private.is_empty() {
            None
        } else {
            let pool = self
                .build_pool(&private, config.upstream_mode, &bootstrap, &mut resolved)
                .await?;
            Some(Arc::new(pool) as Arc<dyn DnsForwarder>)
        };

        Ok(BuiltUpstreams {
            upstreams: Arc::new(upstreams),
            private_upstreams,
        })
    }

    async fn build_pool(
        &self,
        set: &UpstreamSet,
        mode: UpstreamMode,
        bootstrap: &Bootstrap,
        resolved: &mut HashMap<DnsProtocol, Arc<dyn DnsUpstream>>,
    ) -> Result<UpstreamPool, ValidationError> {
        let mut default = Vec::with_capacity(set.default.len());
        for protocol in &set.default {
            default.push(Self::upstream(protocol, bootstrap, resolved).await?);
        }

        let strategy = Strategy::from_mode(mode, Arc::clone(&self.prober));
        let mut pool = UpstreamPool::new(strategy, default);
        for route in &set.domain_specific {
            let mut upstreams = Vec::with_capacity(route.servers.len());
            for protocol in &route.servers {
                upstreams.push(Self::upstream(protocol, bootstrap, resolved).await?);
            }
            pool = pool.with_domain_upstreams(Arc::clone(&route.domain), upstreams);
        }
        Ok(pool)
    }

    async fn upstream(
        protocol: &DnsProtocol,
        bootstrap: &Bootstrap,
        resolved: &mut HashMap<DnsProtocol, Arc<dyn DnsUpstream>>,
    ) -> Result<Arc<dyn DnsUpstream>, ValidationError> {
        if let Some(upstream) = resolved.get(protocol) {
            return Ok(Arc::clone(upstream));
        }

        let invalid = |cause: String| ValidationError::InvalidUpstream {
            address: protocol.to_string(),
            cause,
        };

        let target = match protocol.addr().unresolved_parts() {
            Some((hostname, port)) => {
                let ip = bootstrap
                    .resolve(hostname)
                    .await
                    .map_err(|e| invalid(format!("resolving {}: {}", hostname, e)))?;
                info!(upstream = %protocol, address = %ip, "Upstream hostname resolved");
                protocol.with_resolved_addr(SocketAddr::new(ip, port))
            }
            None => protocol.clone(),
        };

        let upstream: Arc<dyn DnsUpstream> =
            Arc::new(UpstreamResolver::new(target).map_err(|e| invalid(e.to_string()))?);
        resolved.insert(protocol.clone(), Arc::clone(&upstream));
        Ok(upstream)
    }
}

impl Default for UpstreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}
