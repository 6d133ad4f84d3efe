use dnsforward_domain::DnsAnswer;

/// An answer as stored in the cache. Never mutated after insertion.
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub answer: DnsAnswer,
    /// Unix seconds at insertion.
    pub stored_at: u64,
    /// Effective TTL after clamping.
    pub ttl: u32,
    /// Insertion sequence number, used to match FIFO entries.
    pub seq: u64,
}

impl CachedAnswer {
    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(u64::from(self.ttl))
    }

    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs > self.expires_at()
    }

    /// Seconds left before expiry.
    pub fn remaining_ttl(&self, now_secs: u64) -> u32 {
        u32::try_from(self.expires_at().saturating_sub(now_secs)).unwrap_or(u32::MAX)
    }
}
