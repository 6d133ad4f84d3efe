use super::blocking::BlockingMode;
use super::upstream::UpstreamMode;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Published forwarding configuration.
///
/// Immutable once published: a change produces a new value that replaces the
/// old one wholesale. Field order is the JSON order seen by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Upstream servers, one per line (`host:port`, `tls://`, `https://`, `[/domain/]`...)
    #[serde(default = "default_upstreams")]
    pub upstream_dns: Vec<String>,

    /// Path of a file holding upstreams. Carried for the control plane only.
    #[serde(default)]
    pub upstream_dns_file: String,

    /// Plain DNS servers used to resolve upstream hostnames
    #[serde(default = "default_bootstrap")]
    pub bootstrap_dns: Vec<String>,

    #[serde(default = "default_true")]
    pub protection_enabled: bool,

    /// Queries per second per client, 0 disables limiting
    #[serde(default)]
    pub ratelimit: u32,

    #[serde(default)]
    pub blocking_mode: BlockingMode,

    #[serde(default, with = "empty_as_none")]
    pub blocking_ipv4: Option<Ipv4Addr>,

    #[serde(default, with = "empty_as_none")]
    pub blocking_ipv6: Option<Ipv6Addr>,

    #[serde(default)]
    pub edns_cs_enabled: bool,

    #[serde(default)]
    pub dnssec_enabled: bool,

    #[serde(default)]
    pub disable_ipv6: bool,

    #[serde(default)]
    pub upstream_mode: UpstreamMode,

    /// Maximum number of cached answers, 0 disables the cache
    #[serde(default)]
    pub cache_size: u32,

    #[serde(default)]
    pub cache_ttl_min: u32,

    /// 0 means no upper bound
    #[serde(default)]
    pub cache_ttl_max: u32,

    #[serde(default)]
    pub resolve_clients: bool,

    /// Servers used only for reverse lookups of client addresses
    #[serde(default)]
    pub local_ptr_upstreams: Vec<String>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_dns: default_upstreams(),
            upstream_dns_file: String::new(),
            bootstrap_dns: default_bootstrap(),
            protection_enabled: true,
            ratelimit: 0,
            blocking_mode: BlockingMode::Default,
            blocking_ipv4: None,
            blocking_ipv6: None,
            edns_cs_enabled: false,
            dnssec_enabled: false,
            disable_ipv6: false,
            upstream_mode: UpstreamMode::Sequential,
            cache_size: 0,
            cache_ttl_min: 0,
            cache_ttl_max: 0,
            resolve_clients: false,
            local_ptr_upstreams: Vec::new(),
        }
    }
}

impl DnsConfig {
    /// Clamps a record TTL into `[cache_ttl_min, cache_ttl_max]`; a zero max is unbounded.
    pub fn effective_ttl(&self, record_ttl: u32) -> u32 {
        let ttl = record_ttl.max(self.cache_ttl_min);
        if self.cache_ttl_max == 0 {
            ttl
        } else {
            ttl.min(self.cache_ttl_max)
        }
    }
}

fn default_upstreams() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_bootstrap() -> Vec<String> {
    ["9.9.9.10", "149.112.112.10", "2620:fe::10", "2620:fe::fe:10"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

/// Unset addresses travel as `""`.
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
