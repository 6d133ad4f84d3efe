use super::strategy::Strategy;
use async_trait::async_trait;
use dnsforward_application::ports::{DnsForwarder, DnsUpstream, QueryOptions, UpstreamAnswer};
use dnsforward_domain::config::matches_domain;
use dnsforward_domain::{DnsQuery, DomainError};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

struct DomainRoute {
    domain: Arc<str>,
    /// Empty routes the domain back to the default upstreams.
    upstreams: Vec<Arc<dyn DnsUpstream>>,
}

/// Upstreams of one configuration snapshot, queried with that snapshot's mode.
///
/// Queries for a domain with dedicated upstreams go to the most specific
/// matching route; everything else goes to the default list.
pub struct UpstreamPool {
    strategy: Strategy,
    default: Vec<Arc<dyn DnsUpstream>>,
    routes: Vec<DomainRoute>,
}

impl UpstreamPool {
    pub fn new(strategy: Strategy, default: Vec<Arc<dyn DnsUpstream>>) -> Self {
        Self {
            strategy,
            default,
            routes: Vec::new(),
        }
    }

    pub fn with_domain_upstreams(
        mut self,
        domain: impl Into<Arc<str>>,
        upstreams: Vec<Arc<dyn DnsUpstream>>,
    ) -> Self {
        self.routes.push(DomainRoute {
            domain: domain.into(),
            upstreams,
        });
        self.routes
            .sort_by(|a, b| b.domain.len().cmp(&a.domain.len()));
        self
    }

    /// Upstreams a query for `name` is sent to.
    pub fn select(&self, name: &str) -> &[Arc<dyn DnsUpstream>] {
        self.routes
            .iter()
            .find(|route| matches_domain(&route.domain, name))
            .filter(|route| !route.upstreams.is_empty())
            .map_or(&self.default, |route| &route.upstreams)
    }

    pub fn default_upstreams(&self) -> &[Arc<dyn DnsUpstream>] {
        &self.default
    }
}

#[async_trait]
impl DnsForwarder for UpstreamPool {
    async fn forward(
        &self,
        query: &DnsQuery,
        options: &QueryOptions,
        deadline: Instant,
    ) -> Result<UpstreamAnswer, DomainError> {
        let upstreams = self.select(&query.domain);
        debug!(
            strategy = self.strategy.name(),
            servers = upstreams.len(),
            domain = %query.domain,
            record_type = %query.record_type,
            "Forwarding query"
        );

        tokio::time::timeout_at(
            deadline,
            self.strategy.query_refs(upstreams, query, options, deadline),
        )
        .await
        .unwrap_or(Err(DomainError::QueryTimeout))
    }
}
