use super::errors::ValidationError;
use crate::dns_protocol::{DnsProtocol, DEFAULT_DNS_PORT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Strategy used to spread a query over the upstream list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum UpstreamMode {
    /// Try upstreams one after another in configured order. Empty string on the wire.
    #[default]
    #[serde(rename = "")]
    Sequential,
    /// Ask every upstream at once, first successful answer wins.
    #[serde(rename = "parallel")]
    Parallel,
    /// Ask every upstream at once, keep the answer whose address is quickest to reach.
    #[serde(rename = "fastest_addr")]
    FastestAddr,
}

impl UpstreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamMode::Sequential => "",
            UpstreamMode::Parallel => "parallel",
            UpstreamMode::FastestAddr => "fastest_addr",
        }
    }
}

impl FromStr for UpstreamMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(UpstreamMode::Sequential),
            "parallel" => Ok(UpstreamMode::Parallel),
            "fastest_addr" => Ok(UpstreamMode::FastestAddr),
            _ => Err(ValidationError::InvalidUpstreamMode),
        }
    }
}

impl fmt::Display for UpstreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstreams reserved for one domain and its subdomains.
/// Empty `servers` sends the domain back to the default upstreams (`[/domain/]#`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainUpstreams {
    pub domain: Arc<str>,
    pub servers: Vec<DnsProtocol>,
}

/// Parsed form of an upstream list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamSet {
    pub default: Vec<DnsProtocol>,
    pub domain_specific: Vec<DomainUpstreams>,
}

impl UpstreamSet {
    /// Parses `upstream_dns`. Ports are mandatory and at least one default
    /// upstream is required.
    pub fn parse(lines: &[String]) -> Result<Self, ValidationError> {
        let set = Self::parse_lines(lines, None)?;
        if set.default.is_empty() {
            return Err(ValidationError::InvalidUpstream {
                address: String::new(),
                cause: "no default upstream servers specified".to_string(),
            });
        }
        Ok(set)
    }

    /// Parses `local_ptr_upstreams`. Bare IPs default to port 53 and the list may be empty.
    pub fn parse_private(lines: &[String]) -> Result<Self, ValidationError> {
        Self::parse_lines(lines, Some(DEFAULT_DNS_PORT))
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.domain_specific.iter().all(|d| d.servers.is_empty())
    }

    /// Every distinct server mentioned in the set.
    pub fn all_servers(&self) -> impl Iterator<Item = &DnsProtocol> {
        self.default
            .iter()
            .chain(self.domain_specific.iter().flat_map(|d| d.servers.iter()))
    }

    fn parse_lines(lines: &[String], default_port: Option<u16>) -> Result<Self, ValidationError> {
        let mut set = UpstreamSet::default();

        for line in lines {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }

            let invalid = |cause: String| ValidationError::InvalidUpstream {
                address: line.to_string(),
                cause,
            };

            let Some(rest) = line.strip_prefix("[/") else {
                let server = DnsProtocol::parse_with_default_port(line, default_port)
                    .map_err(invalid)?;
                set.default.push(server);
                continue;
            };

            let (domains, targets) = rest
                .split_once("/]")
                .ok_or_else(|| invalid(format!("{} is not a domain-specific upstream", line)))?;

            let domains: Vec<Arc<str>> = domains
                .split('/')
                .filter(|d| !d.is_empty())
                .map(|d| Arc::from(d.trim_end_matches('.').to_ascii_lowercase()))
                .collect();
            if domains.is_empty() {
                return Err(invalid(format!("{} has no domains", line)));
            }

            let targets = targets.trim();
            let servers = if targets == "#" {
                Vec::new()
            } else {
                targets
                    .split_whitespace()
                    .map(|target| DnsProtocol::parse_with_default_port(target, default_port))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(invalid)?
            };
            if servers.is_empty() && targets != "#" {
                return Err(invalid(crate::dns_protocol::MISSING_PORT.to_string()));
            }

            for domain in domains {
                set.domain_specific.push(DomainUpstreams {
                    domain,
                    servers: servers.clone(),
                });
            }
        }

        Ok(set)
    }
}

/// `rule` matches the name itself and any subdomain of it.
pub fn matches_domain(rule: &str, name: &str) -> bool {
    let name = name.trim_end_matches('.');
    if name.len() < rule.len() {
        return false;
    }
    let split = name.len() - rule.len();
    name.as_bytes()[split..].eq_ignore_ascii_case(rule.as_bytes())
        && (split == 0 || name.as_bytes()[split - 1] == b'.')
}

/// Bootstrap servers must be reachable without resolving anything themselves:
/// an IP literal with an optional port and an optional `udp://`/`tcp://` scheme.
pub fn parse_bootstrap(address: &str) -> Result<DnsProtocol, ValidationError> {
    let not_eligible = || ValidationError::InvalidBootstrap {
        address: address.to_string(),
        cause: format!(
            "invalid bootstrap server address: Resolver {} is not eligible to be a bootstrap DNS server",
            address
        ),
    };

    let trimmed = address.trim();
    if trimmed.starts_with("tls://") || trimmed.starts_with("https://") {
        return Err(not_eligible());
    }

    match DnsProtocol::parse_with_default_port(trimmed, Some(DEFAULT_DNS_PORT)) {
        Ok(protocol) if !protocol.needs_resolution() => Ok(protocol),
        _ => Err(not_eligible()),
    }
}
