use crate::dns::load_balancer::builder::{BuiltUpstreams, UpstreamBuilder};
use arc_swap::{ArcSwap, Guard};
use async_trait::async_trait;
use dnsforward_application::ports::{QueryCachePort, RuntimeConfigPort, RuntimeSnapshot};
use dnsforward_domain::config::validate;
use dnsforward_domain::{ConfigCandidate, ConfigError, DnsConfig, DnsConfigPatch, ValidationError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the published configuration.
///
/// A change is validated, its upstreams are built, and only then is a new
/// snapshot swapped in. Readers hold whichever snapshot they loaded; a
/// rejected change never touches the published one.
pub struct ConfigManager {
    current: ArcSwap<RuntimeSnapshot>,
    builder: UpstreamBuilder,
    cache: Option<Arc<dyn QueryCachePort>>,
}

impl ConfigManager {
    /// Validates `config` and builds its first snapshot.
    pub async fn new(config: DnsConfig) -> Result<Self, ConfigError> {
        Self::with_builder(config, UpstreamBuilder::new()).await
    }

    pub async fn with_builder(
        config: DnsConfig,
        builder: UpstreamBuilder,
    ) -> Result<Self, ConfigError> {
        let config = validate(&ConfigCandidate::from(&config))?;
        let built = builder.build(&config).await?;
        let snapshot = RuntimeSnapshot {
            config: Arc::new(config),
            upstreams: built.upstreams,
            private_upstreams: built.private_upstreams,
            generation: 1,
        };
        info!(
            upstreams = snapshot.config.upstream_dns.len(),
            upstream_mode = %snapshot.config.upstream_mode.as_str(),
            "Configuration loaded"
        );

        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            builder,
            cache: None,
        })
    }

    /// Cache to clear when a change affects what it holds.
    pub fn with_cache(mut self, cache: Arc<dyn QueryCachePort>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn validate(&self, candidate: &ConfigCandidate) -> Result<DnsConfig, ValidationError> {
        validate(candidate)
    }

    pub fn get_config(&self) -> Arc<DnsConfig> {
        Arc::clone(&self.current.load().config)
    }

    pub fn get_config_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(&*self.get_config()).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies a JSON patch such as `{"upstream_mode":"parallel"}`.
    pub async fn set_config_json(&self, json: &str) -> Result<(), ConfigError> {
        let patch = DnsConfigPatch::from_json(json)?;
        self.update(patch).await.map(|_| ())
    }

    /// Upstreams for `config`, reusing the published ones when the
    /// settings they depend on are unchanged.
    async fn upstreams_for(
        &self,
        config: &DnsConfig,
        base: &RuntimeSnapshot,
    ) -> Result<BuiltUpstreams, ValidationError> {
        if same_upstreams(config, &base.config) {
            return Ok(BuiltUpstreams {
                upstreams: Arc::clone(&base.upstreams),
                private_upstreams: base.private_upstreams.clone(),
            });
        }
        self.builder.build(config).await
    }

    /// Swaps in `config` if the published snapshot is still `base`.
    fn try_publish(
        &self,
        base: &Arc<RuntimeSnapshot>,
        config: DnsConfig,
        built: BuiltUpstreams,
    ) -> Result<Arc<RuntimeSnapshot>, Arc<RuntimeSnapshot>> {
        let next = Arc::new(RuntimeSnapshot {
            config: Arc::new(config),
            upstreams: built.upstreams,
            private_upstreams: built.private_upstreams,
            generation: base.generation + 1,
        });

        let previous = self.current.compare_and_swap(base, Arc::clone(&next));
        if !Arc::ptr_eq(&*previous, base) {
            return Err(Guard::into_inner(previous));
        }

        if let Some(cache) = &self.cache {
            if affects_cache(&next.config, &base.config) {
                cache.clear();
                debug!("Cache cleared after configuration change");
            }
        }
        info!(
            generation = next.generation,
            upstreams = next.config.upstream_dns.len(),
            upstream_mode = %next.config.upstream_mode.as_str(),
            "Configuration applied"
        );
        Ok(next)
    }

    async fn apply_with(
        &self,
        make_candidate: impl Fn(&DnsConfig) -> ConfigCandidate + Send + Sync,
    ) -> Result<Arc<RuntimeSnapshot>, ConfigError> {
        let mut base = self.current.load_full();
        loop {
            let config = validate(&make_candidate(&base.config)).inspect_err(|e| {
                warn!(error = %e, "Configuration rejected");
            })?;
            let built = self.upstreams_for(&config, &base).await.inspect_err(|e| {
                warn!(error = %e, "Configuration rejected");
            })?;

            match self.try_publish(&base, config, built) {
                Ok(published) => return Ok(published),
                Err(newer) => {
                    debug!(
                        generation = newer.generation,
                        "Configuration changed concurrently, retrying"
                    );
                    base = newer;
                }
            }
        }
    }
}

#[async_trait]
impl RuntimeConfigPort for ConfigManager {
    fn snapshot(&self) -> Arc<RuntimeSnapshot> {
        self.current.load_full()
    }

    async fn apply(&self, candidate: ConfigCandidate) -> Result<Arc<RuntimeSnapshot>, ConfigError> {
        self.apply_with(move |_| candidate.clone()).await
    }

    async fn update(&self, patch: DnsConfigPatch) -> Result<Arc<RuntimeSnapshot>, ConfigError> {
        self.apply_with(move |current| patch.clone().overlay(ConfigCandidate::from(current)))
            .await
    }
}

fn same_upstreams(a: &DnsConfig, b: &DnsConfig) -> bool {
    a.upstream_dns == b.upstream_dns
        && a.bootstrap_dns == b.bootstrap_dns
        && a.upstream_mode == b.upstream_mode
        && a.local_ptr_upstreams == b.local_ptr_upstreams
}

fn affects_cache(a: &DnsConfig, b: &DnsConfig) -> bool {
    a.upstream_dns != b.upstream_dns
        || a.cache_size != b.cache_size
        || a.cache_ttl_min != b.cache_ttl_min
        || a.cache_ttl_max != b.cache_ttl_max
        || a.edns_cs_enabled != b.edns_cs_enabled
        || a.dnssec_enabled != b.dnssec_enabled
}
