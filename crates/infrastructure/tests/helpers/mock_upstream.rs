#![allow(dead_code)]
use async_trait::async_trait;
use dnsforward_application::ports::{DnsUpstream, QueryOptions};
use dnsforward_domain::{AnswerRecord, DnsAnswer, DnsQuery, DomainError, RecordData, ResponseCode};
use dnsforward_infrastructure::dns::load_balancer::AddressProber;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn a_answer(domain: &str, ips: &[[u8; 4]], ttl: u32) -> DnsAnswer {
    DnsAnswer::new(
        ResponseCode::NoError,
        ips.iter()
            .map(|ip| AnswerRecord::new(domain, ttl, RecordData::A(Ipv4Addr::from(*ip))))
            .collect(),
    )
}

/// Upstream that answers (or fails) after a fixed delay.
pub struct MockUpstream {
    address: String,
    answer: Option<DnsAnswer>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockUpstream {
    pub fn answering(address: &str, answer: DnsAnswer) -> Self {
        Self {
            address: address.to_string(),
            answer: Some(answer),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(address: &str) -> Self {
        Self {
            address: address.to_string(),
            answer: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsUpstream for MockUpstream {
    async fn exchange(
        &self,
        _query: &DnsQuery,
        _options: &QueryOptions,
        timeout: Duration,
    ) -> Result<DnsAnswer, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(DomainError::TransportTimeout {
                server: self.address.clone(),
            });
        }
        tokio::time::sleep(self.delay).await;
        self.answer.clone().ok_or_else(|| DomainError::TransportConnectionRefused {
            server: self.address.clone(),
        })
    }

    fn address(&self) -> &str {
        &self.address
    }
}

/// Prober with a fixed round-trip time per address; unknown addresses never answer.
#[derive(Default)]
pub struct MockProber {
    rtts: HashMap<IpAddr, Duration>,
    probes: AtomicUsize,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rtt(mut self, ip: [u8; 4], rtt: Duration) -> Self {
        self.rtts.insert(IpAddr::V4(Ipv4Addr::from(ip)), rtt);
        self
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressProber for MockProber {
    async fn probe(&self, ip: IpAddr, timeout: Duration) -> Option<Duration> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.rtts.get(&ip) {
            Some(rtt) if *rtt <= timeout => {
                tokio::time::sleep(*rtt).await;
                Some(*rtt)
            }
            _ => {
                tokio::time::sleep(timeout).await;
                None
            }
        }
    }
}
