use super::dns::DnsConfig;
use super::errors::ConfigError;
use serde::{Deserialize, Deserializer};

/// Unvalidated configuration: the current configuration with a patch laid
/// over it, in the raw shape users send. Enumerations and addresses are kept
/// as strings so validation can report the first bad field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCandidate {
    pub upstream_dns: Vec<String>,
    pub upstream_dns_file: String,
    pub bootstrap_dns: Vec<String>,
    pub protection_enabled: bool,
    pub ratelimit: i64,
    pub blocking_mode: String,
    pub blocking_ipv4: String,
    pub blocking_ipv6: String,
    pub edns_cs_enabled: bool,
    pub dnssec_enabled: bool,
    pub disable_ipv6: bool,
    pub upstream_mode: String,
    pub cache_size: u32,
    pub cache_ttl_min: u32,
    pub cache_ttl_max: u32,
    pub resolve_clients: bool,
    pub local_ptr_upstreams: Vec<String>,
}

impl From<&DnsConfig> for ConfigCandidate {
    fn from(config: &DnsConfig) -> Self {
        Self {
            upstream_dns: config.upstream_dns.clone(),
            upstream_dns_file: config.upstream_dns_file.clone(),
            bootstrap_dns: config.bootstrap_dns.clone(),
            protection_enabled: config.protection_enabled,
            ratelimit: i64::from(config.ratelimit),
            blocking_mode: config.blocking_mode.as_str().to_string(),
            blocking_ipv4: config
                .blocking_ipv4
                .map(|ip| ip.to_string())
                .unwrap_or_default(),
            blocking_ipv6: config
                .blocking_ipv6
                .map(|ip| ip.to_string())
                .unwrap_or_default(),
            edns_cs_enabled: config.edns_cs_enabled,
            dnssec_enabled: config.dnssec_enabled,
            disable_ipv6: config.disable_ipv6,
            upstream_mode: config.upstream_mode.as_str().to_string(),
            cache_size: config.cache_size,
            cache_ttl_min: config.cache_ttl_min,
            cache_ttl_max: config.cache_ttl_max,
            resolve_clients: config.resolve_clients,
            local_ptr_upstreams: config.local_ptr_upstreams.clone(),
        }
    }
}

/// Partial update sent by the control plane. Absent fields keep their
/// current value; `local_ptr_upstreams: null` clears the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DnsConfigPatch {
    pub upstream_dns: Option<Vec<String>>,
    pub upstream_dns_file: Option<String>,
    pub bootstrap_dns: Option<Vec<String>>,
    pub protection_enabled: Option<bool>,
    pub ratelimit: Option<i64>,
    pub blocking_mode: Option<String>,
    pub blocking_ipv4: Option<String>,
    pub blocking_ipv6: Option<String>,
    pub edns_cs_enabled: Option<bool>,
    pub dnssec_enabled: Option<bool>,
    pub disable_ipv6: Option<bool>,
    pub upstream_mode: Option<String>,
    pub cache_size: Option<u32>,
    pub cache_ttl_min: Option<u32>,
    pub cache_ttl_max: Option<u32>,
    pub resolve_clients: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub local_ptr_upstreams: Option<Option<Vec<String>>>,
}

/// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl DnsConfigPatch {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn overlay(self, base: ConfigCandidate) -> ConfigCandidate {
        ConfigCandidate {
            upstream_dns: self.upstream_dns.unwrap_or(base.upstream_dns),
            upstream_dns_file: self.upstream_dns_file.unwrap_or(base.upstream_dns_file),
            bootstrap_dns: self.bootstrap_dns.unwrap_or(base.bootstrap_dns),
            protection_enabled: self.protection_enabled.unwrap_or(base.protection_enabled),
            ratelimit: self.ratelimit.unwrap_or(base.ratelimit),
            blocking_mode: self.blocking_mode.unwrap_or(base.blocking_mode),
            blocking_ipv4: self.blocking_ipv4.unwrap_or(base.blocking_ipv4),
            blocking_ipv6: self.blocking_ipv6.unwrap_or(base.blocking_ipv6),
            edns_cs_enabled: self.edns_cs_enabled.unwrap_or(base.edns_cs_enabled),
            dnssec_enabled: self.dnssec_enabled.unwrap_or(base.dnssec_enabled),
            disable_ipv6: self.disable_ipv6.unwrap_or(base.disable_ipv6),
            upstream_mode: self.upstream_mode.unwrap_or(base.upstream_mode),
            cache_size: self.cache_size.unwrap_or(base.cache_size),
            cache_ttl_min: self.cache_ttl_min.unwrap_or(base.cache_ttl_min),
            cache_ttl_max: self.cache_ttl_max.unwrap_or(base.cache_ttl_max),
            resolve_clients: self.resolve_clients.unwrap_or(base.resolve_clients),
            local_ptr_upstreams: match self.local_ptr_upstreams {
                Some(list) => list.unwrap_or_default(),
                None => base.local_ptr_upstreams,
            },
        }
    }
}
