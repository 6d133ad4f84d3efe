use dnsforward_domain::{DnsAnswer, DnsQuery};
use std::net::IpAddr;

/// Verdict of the filtering subsystem for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Allow,
    Block,
    /// Answer with this instead of resolving.
    Rewrite(DnsAnswer),
}

/// Filtering subsystem, consulted as a black box. Decisions are made from
/// in-memory state, so the call is synchronous.
pub trait QueryFilter: Send + Sync {
    fn decide(&self, query: &DnsQuery, client_ip: IpAddr) -> FilterDecision;
}

/// Filter used when no filtering subsystem is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllFilter;

impl QueryFilter for AllowAllFilter {
    fn decide(&self, _query: &DnsQuery, _client_ip: IpAddr) -> FilterDecision {
        FilterDecision::Allow
    }
}
