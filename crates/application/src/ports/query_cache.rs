use dnsforward_domain::{ClientSubnet, DnsAnswer, DnsConfig, DnsQuery, RecordType};
use std::sync::Arc;

/// Normalized cache key. Client identity is not part of it; the client
/// subnet is, when EDNS Client Subnet is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub query_class: u16,
    pub subnet: Option<ClientSubnet>,
}

impl CacheKey {
    pub fn new(query: &DnsQuery, subnet: Option<ClientSubnet>) -> Self {
        Self {
            name: Arc::from(query.normalized_name()),
            record_type: query.record_type,
            query_class: query.query_class,
            subnet,
        }
    }
}

pub trait QueryCachePort: Send + Sync {
    /// Live entry for `key` with TTLs lowered to the time left, or `None`.
    fn lookup(&self, key: &CacheKey, now_secs: u64) -> Option<DnsAnswer>;

    /// Stores `answer` for `clamp(record_ttl, cache_ttl_min, cache_ttl_max)`
    /// seconds, honouring `cache_size` from `config`.
    fn store(
        &self,
        key: CacheKey,
        answer: &DnsAnswer,
        record_ttl: u32,
        config: &DnsConfig,
        now_secs: u64,
    );

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
