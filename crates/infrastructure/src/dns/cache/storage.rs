use super::data::CachedAnswer;
use super::eviction::FifoOrder;
use dashmap::DashMap;
use dnsforward_application::ports::{CacheKey, QueryCachePort};
use dnsforward_domain::{DnsAnswer, DnsConfig};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Shared answer cache with FIFO eviction and lazy expiry.
///
/// The capacity is read from the configuration on every store, so a new
/// `cache_size` takes effect without rebuilding the cache. Lookups only touch
/// the sharded map; the eviction queue is locked by stores alone.
pub struct QueryCache {
    entries: DashMap<CacheKey, CachedAnswer, FxBuildHasher>,
    order: FifoOrder,
    next_seq: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            order: FifoOrder::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    fn evict_to(&self, capacity: usize) {
        while self.entries.len() > capacity {
            let Some((key, seq)) = self.order.pop_oldest() else {
                break;
            };
            if self.entries.remove_if(&key, |_, cached| cached.seq == seq).is_some() {
                debug!(domain = %key.name, record_type = %key.record_type, "Cache entry evicted");
            }
        }

        // stale positions left behind by re-stored keys
        if self.order.len() > capacity.saturating_mul(2).max(64) {
            self.order.retain(|key, seq| {
                self.entries
                    .get(key)
                    .is_some_and(|cached| cached.seq == seq)
            });
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCachePort for QueryCache {
    fn lookup(&self, key: &CacheKey, now_secs: u64) -> Option<DnsAnswer> {
        let expired_seq = {
            let cached = self.entries.get(key)?;
            if !cached.is_expired(now_secs) {
                return Some(cached.answer.with_ttl_capped(cached.remaining_ttl(now_secs)));
            }
            cached.seq
        };

        self.entries
            .remove_if(key, |_, cached| cached.seq == expired_seq);
        None
    }

    fn store(
        &self,
        key: CacheKey,
        answer: &DnsAnswer,
        record_ttl: u32,
        config: &DnsConfig,
        now_secs: u64,
    ) {
        if config.cache_size == 0 {
            return;
        }
        let ttl = config.effective_ttl(record_ttl);
        if ttl == 0 {
            return;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            key.clone(),
            CachedAnswer {
                answer: answer.clone(),
                stored_at: now_secs,
                ttl,
                seq,
            },
        );
        self.order.push(key, seq);
        self.evict_to(config.cache_size as usize);
    }

    fn clear(&self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
