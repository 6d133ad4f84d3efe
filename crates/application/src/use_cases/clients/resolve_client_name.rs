use crate::ports::{HostnameResolver, RuntimeSnapshot};
use dashmap::DashMap;
use lru::LruCache;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;

/// Client names remembered before the least recently seen one is dropped.
pub const DEFAULT_NAME_CAPACITY: usize = 10_000;

/// Reverse lookups allowed in flight at once. Triggers beyond this are dropped.
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Reverse-resolves client addresses into hostnames and remembers the result.
///
/// Failed or empty lookups are stored as an empty name so the same client is
/// not looked up again on every query.
pub struct ResolveClientNameUseCase {
    hostname_resolver: Arc<dyn HostnameResolver>,
    names: Mutex<LruCache<IpAddr, Arc<str>>>,
    pending: DashMap<IpAddr, ()>,
    lookups: Arc<Semaphore>,
}

impl ResolveClientNameUseCase {
    pub fn new(hostname_resolver: Arc<dyn HostnameResolver>) -> Self {
        Self::with_limits(hostname_resolver, DEFAULT_NAME_CAPACITY, DEFAULT_MAX_PENDING)
    }

    pub fn with_limits(
        hostname_resolver: Arc<dyn HostnameResolver>,
        capacity: usize,
        max_pending: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            hostname_resolver,
            names: Mutex::new(LruCache::new(capacity)),
            pending: DashMap::new(),
            lookups: Arc::new(Semaphore::new(max_pending.max(1))),
        }
    }

    /// Last known name of `ip`; `Some("")` when the lookup found nothing.
    pub fn hostname(&self, ip: IpAddr) -> Option<Arc<str>> {
        self.lock_names().get(&ip).map(Arc::clone)
    }

    /// Number of client names currently remembered.
    pub fn known_clients(&self) -> usize {
        self.lock_names().len()
    }

    pub fn forget_all(&self) {
        self.lock_names().clear();
    }

    /// Starts a background lookup for `ip` unless it is known or already in flight.
    /// Never waits for the lookup, and drops it when too many are in flight.
    pub fn trigger(self: &Arc<Self>, ip: IpAddr, snapshot: Arc<RuntimeSnapshot>) {
        if ip.is_loopback() || ip.is_unspecified() || self.lock_names().contains(&ip) {
            return;
        }
        let Ok(permit) = Arc::clone(&self.lookups).try_acquire_owned() else {
            debug!(ip = %ip, "Too many reverse lookups in flight, skipping");
            return;
        };
        if self.pending.insert(ip, ()).is_some() {
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.execute(ip, &snapshot).await;
            this.pending.remove(&ip);
            drop(permit);
        });
    }

    /// Looks `ip` up and stores the outcome. Errors degrade to an empty name.
    pub async fn execute(&self, ip: IpAddr, snapshot: &RuntimeSnapshot) -> Arc<str> {
        let name: Arc<str> = match self.hostname_resolver.resolve_hostname(ip, snapshot).await {
            Ok(Some(hostname)) => {
                debug!(ip = %ip, hostname = %hostname, "Client hostname resolved");
                Arc::from(hostname)
            }
            Ok(None) => {
                debug!(ip = %ip, "No PTR record found");
                Arc::from("")
            }
            Err(e) => {
                debug!(error = %e, ip = %ip, "Hostname resolution failed");
                Arc::from("")
            }
        };
        self.lock_names().put(ip, Arc::clone(&name));
        name
    }

    fn lock_names(&self) -> std::sync::MutexGuard<'_, LruCache<IpAddr, Arc<str>>> {
        self.names.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
