pub mod dns_forwarder;
pub mod dns_upstream;
pub mod hostname_resolver;
pub mod query_cache;
pub mod query_filter;
pub mod runtime_config;

pub use dns_forwarder::{DnsForwarder, UpstreamAnswer};
pub use dns_upstream::{DnsUpstream, QueryOptions};
pub use hostname_resolver::HostnameResolver;
pub use query_cache::{CacheKey, QueryCachePort};
pub use query_filter::{AllowAllFilter, FilterDecision, QueryFilter};
pub use runtime_config::{RuntimeConfigPort, RuntimeSnapshot};
