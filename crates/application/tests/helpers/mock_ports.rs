#![allow(dead_code)]

use async_trait::async_trait;
use dnsforward_application::ports::{
    CacheKey, DnsForwarder, FilterDecision, HostnameResolver, QueryCachePort, QueryFilter,
    QueryOptions, RuntimeConfigPort, RuntimeSnapshot, UpstreamAnswer,
};
use dnsforward_domain::config::validate;
use dnsforward_domain::{
    AnswerRecord, ConfigCandidate, ConfigError, DnsAnswer, DnsConfig, DnsConfigPatch, DnsQuery,
    DomainError, RecordData, ResponseCode,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock as StdRwLock};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub fn a_answer(name: &str, ip: [u8; 4], ttl: u32) -> DnsAnswer {
    DnsAnswer::new(
        ResponseCode::NoError,
        vec![AnswerRecord::new(name, ttl, RecordData::A(Ipv4Addr::from(ip)))],
    )
}

// ============================================================================
// Mock DnsForwarder
// ============================================================================

#[derive(Clone)]
pub struct MockForwarder {
    name: Arc<str>,
    responses: Arc<RwLock<HashMap<String, DnsAnswer>>>,
    should_fail: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
    last_options: Arc<Mutex<Option<QueryOptions>>>,
}

impl MockForwarder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            responses: Arc::new(RwLock::new(HashMap::new())),
            should_fail: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
            last_options: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn set_response(&self, domain: &str, answer: DnsAnswer) {
        self.responses
            .write()
            .await
            .insert(domain.to_string(), answer);
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<QueryOptions> {
        *self.last_options.lock().unwrap()
    }
}

#[async_trait]
impl DnsForwarder for MockForwarder {
    async fn forward(
        &self,
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Result<UpstreamAnswer, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(*options);

        if let Some(delay) = *self.delay.read().await {
            if tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                .await
                .is_err()
            {
                return Err(DomainError::QueryTimeout);
            }
        }

        if *self.should_fail.read().await {
            return Err(DomainError::TransportAllServersUnreachable);
        }

        let responses = self.responses.read().await;
        let answer = responses
            .get(query.domain.as_ref())
            .cloned()
            .unwrap_or_else(DnsAnswer::nxdomain);
        Ok(UpstreamAnswer {
            answer,
            server: Arc::clone(&self.name),
            latency_ms: 1,
        })
    }
}

// ============================================================================
// Mock RuntimeConfigPort
// ============================================================================

/// Publishes snapshots that all share the same forwarders.
pub struct MockRuntimeConfig {
    current: StdRwLock<Arc<RuntimeSnapshot>>,
    upstreams: Arc<dyn DnsForwarder>,
    private_upstreams: Option<Arc<dyn DnsForwarder>>,
}

impl MockRuntimeConfig {
    pub fn new(config: DnsConfig, upstreams: Arc<dyn DnsForwarder>) -> Self {
        Self::with_private(config, upstreams, None)
    }

    pub fn with_private(
        config: DnsConfig,
        upstreams: Arc<dyn DnsForwarder>,
        private_upstreams: Option<Arc<dyn DnsForwarder>>,
    ) -> Self {
        let snapshot = RuntimeSnapshot {
            config: Arc::new(config),
            upstreams: Arc::clone(&upstreams),
            private_upstreams: private_upstreams.clone(),
            generation: 1,
        };
        Self {
            current: StdRwLock::new(Arc::new(snapshot)),
            upstreams,
            private_upstreams,
        }
    }

    pub fn set_config(&self, config: DnsConfig) {
        let mut current = self.current.write().unwrap();
        let generation = current.generation + 1;
        *current = Arc::new(RuntimeSnapshot {
            config: Arc::new(config),
            upstreams: Arc::clone(&self.upstreams),
            private_upstreams: self.private_upstreams.clone(),
            generation,
        });
    }
}

#[async_trait]
impl RuntimeConfigPort for MockRuntimeConfig {
    fn snapshot(&self) -> Arc<RuntimeSnapshot> {
        Arc::clone(&self.current.read().unwrap())
    }

    async fn apply(&self, candidate: ConfigCandidate) -> Result<Arc<RuntimeSnapshot>, ConfigError> {
        let config = validate(&candidate)?;
        self.set_config(config);
        Ok(self.snapshot())
    }

    async fn update(&self, patch: DnsConfigPatch) -> Result<Arc<RuntimeSnapshot>, ConfigError> {
        let candidate = patch.overlay(ConfigCandidate::from(&*self.snapshot().config));
        self.apply(candidate).await
    }
}

// ============================================================================
// Mock QueryCachePort
// ============================================================================

#[derive(Default)]
pub struct MockQueryCache {
    entries: Mutex<HashMap<CacheKey, (DnsAnswer, u64)>>,
    stores: AtomicUsize,
}

impl MockQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn insert(&self, key: CacheKey, answer: DnsAnswer, expires_at: u64) {
        self.entries.lock().unwrap().insert(key, (answer, expires_at));
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

impl QueryCachePort for MockQueryCache {
    fn lookup(&self, key: &CacheKey, now_secs: u64) -> Option<DnsAnswer> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now_secs)
            .map(|(answer, _)| answer.clone())
    }

    fn store(
        &self,
        key: CacheKey,
        answer: &DnsAnswer,
        record_ttl: u32,
        config: &DnsConfig,
        now_secs: u64,
    ) {
        self.stores.fetch_add(1, Ordering::SeqCst);
        let expires_at = now_secs + u64::from(config.effective_ttl(record_ttl));
        self.insert(key, answer.clone(), expires_at);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

// ============================================================================
// Mock QueryFilter
// ============================================================================

#[derive(Default)]
pub struct MockQueryFilter {
    decisions: StdRwLock<HashMap<String, FilterDecision>>,
}

impl MockQueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_decision(&self, domain: &str, decision: FilterDecision) {
        self.decisions
            .write()
            .unwrap()
            .insert(domain.to_string(), decision);
    }
}

impl QueryFilter for MockQueryFilter {
    fn decide(&self, query: &DnsQuery, _client_ip: IpAddr) -> FilterDecision {
        self.decisions
            .read()
            .unwrap()
            .get(query.domain.as_ref())
            .cloned()
            .unwrap_or(FilterDecision::Allow)
    }
}

// ============================================================================
// Mock HostnameResolver
// ============================================================================

#[derive(Clone, Default)]
pub struct MockHostnameResolver {
    names: Arc<RwLock<HashMap<IpAddr, String>>>,
    should_fail: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
}

impl MockHostnameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_hostname(&self, ip: IpAddr, hostname: &str) {
        self.names.write().await.insert(ip, hostname.to_string());
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostnameResolver for MockHostnameResolver {
    async fn resolve_hostname(
        &self,
        ip: IpAddr,
        _snapshot: &RuntimeSnapshot,
    ) -> Result<Option<String>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }
        if *self.should_fail.read().await {
            return Err(DomainError::QueryTimeout);
        }
        Ok(self.names.read().await.get(&ip).cloned())
    }
}
