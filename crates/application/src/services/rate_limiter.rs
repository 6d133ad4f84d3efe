use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::hash::BuildHasher;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tokio::time::Instant;

const SHARD_COUNT: usize = 16;

/// Default number of clients tracked per shard before the least recently
/// seen one is forgotten.
pub const DEFAULT_CLIENTS_PER_SHARD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-client token buckets.
///
/// Capacity and refill rate are both `rate` tokens per second. Buckets live
/// in LRU shards keyed by client address, so a burst of new clients only
/// contends on one shard and idle clients age out on their own.
pub struct RateLimiter {
    shards: Box<[Mutex<LruCache<IpAddr, TokenBucket>>]>,
    hasher: FxBuildHasher,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CLIENTS_PER_SHARD)
    }

    pub fn with_capacity(clients_per_shard: usize) -> Self {
        let capacity = NonZeroUsize::new(clients_per_shard).unwrap_or(NonZeroUsize::MIN);
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(LruCache::new(capacity)))
            .collect();
        Self {
            shards,
            hasher: FxBuildHasher,
        }
    }

    /// Takes one token from `client`'s bucket. `rate == 0` disables limiting.
    pub fn allow(&self, client: IpAddr, rate: u32, now: Instant) -> bool {
        if rate == 0 {
            return true;
        }
        let capacity = f64::from(rate);

        let shard = &self.shards[self.shard_index(&client)];
        let mut buckets = shard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let bucket = buckets.get_or_insert_mut(client, || TokenBucket {
            tokens: capacity,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * capacity).min(capacity);
        bucket.last_refill = now.max(bucket.last_refill);

        if bucket.tokens.floor() >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().map(|buckets| buckets.len()).unwrap_or(0))
            .sum()
    }

    fn shard_index(&self, client: &IpAddr) -> usize {
        (self.hasher.hash_one(client) as usize) % self.shards.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
