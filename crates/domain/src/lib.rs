//! dnsforward domain layer
pub mod client_subnet;
pub mod config;
pub mod dns_protocol;
pub mod dns_query;
pub mod dns_record;
pub mod dns_request;
pub mod errors;

pub use client_subnet::ClientSubnet;
pub use config::{
    BlockingMode, ConfigCandidate, ConfigError, DnsConfig, DnsConfigPatch, UpstreamMode,
    UpstreamSet, ValidationError,
};
pub use dns_protocol::{DnsProtocol, UpstreamAddr};
pub use dns_query::DnsQuery;
pub use dns_record::{AnswerRecord, DnsAnswer, RecordData, RecordType, ResponseCode};
pub use dns_request::DnsRequest;
pub use errors::DomainError;
