use dnsforward_domain::{
    AnswerRecord, BlockingMode, DnsAnswer, DnsConfig, DnsQuery, RecordData, RecordType,
    ResponseCode,
};
use std::net::{Ipv4Addr, Ipv6Addr};

/// TTL of synthesized blocking answers.
pub const BLOCKED_RESPONSE_TTL: u32 = 10;

/// Builds the answer for an administratively blocked query.
#[derive(Debug, Clone, Copy)]
pub struct BlockingSynthesizer {
    ttl: u32,
}

impl BlockingSynthesizer {
    pub fn new() -> Self {
        Self {
            ttl: BLOCKED_RESPONSE_TTL,
        }
    }

    pub fn synthesize(
        &self,
        query: &DnsQuery,
        mode: BlockingMode,
        blocking_ipv4: Option<Ipv4Addr>,
        blocking_ipv6: Option<Ipv6Addr>,
    ) -> DnsAnswer {
        match mode {
            BlockingMode::Default | BlockingMode::NxDomain => DnsAnswer::nxdomain(),
            BlockingMode::Refused => DnsAnswer::refused(),
            BlockingMode::CustomIp => {
                let data = match query.record_type {
                    RecordType::A => blocking_ipv4.map(RecordData::A),
                    RecordType::AAAA => blocking_ipv6.map(RecordData::Aaaa),
                    _ => None,
                };
                let answers = data
                    .map(|data| vec![AnswerRecord::new(query.domain.clone(), self.ttl, data)])
                    .unwrap_or_default();
                DnsAnswer::new(ResponseCode::NoError, answers)
            }
        }
    }

    pub fn synthesize_for(&self, query: &DnsQuery, config: &DnsConfig) -> DnsAnswer {
        self.synthesize(
            query,
            config.blocking_mode,
            config.blocking_ipv4,
            config.blocking_ipv6,
        )
    }
}

impl Default for BlockingSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
