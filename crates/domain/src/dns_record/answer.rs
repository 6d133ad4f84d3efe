use super::RecordType;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Response code of an answer, independent of the wire codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Other(u16),
}

impl ResponseCode {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Other(other),
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(value) => *value,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::Other(_) => "UNKNOWN",
        }
    }

    /// Codes that mean "this server could not help", as opposed to a real answer.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(Arc<str>),
    Ptr(Arc<str>),
    /// Wire-format RDATA of a type the forwarder does not interpret.
    Opaque(Arc<[u8]>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub ttl: u32,
    pub data: RecordData,
}

impl AnswerRecord {
    pub fn new(name: impl Into<Arc<str>>, ttl: u32, data: RecordData) -> Self {
        let record_type = match &data {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::AAAA,
            RecordData::Cname(_) => RecordType::CNAME,
            RecordData::Ptr(_) => RecordType::PTR,
            RecordData::Opaque(_) => RecordType::Other(0),
        };
        Self {
            name: name.into(),
            record_type,
            ttl,
            data,
        }
    }

    pub fn opaque(
        name: impl Into<Arc<str>>,
        record_type: RecordType,
        ttl: u32,
        rdata: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            data: RecordData::Opaque(rdata.into()),
        }
    }
}

/// Answer handed back to the wire codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub rcode: ResponseCode,
    pub answers: Vec<AnswerRecord>,
    /// TTL for negative caching, taken from the authority SOA.
    pub negative_ttl: Option<u32>,
    /// AD flag as reported by the upstream.
    pub authenticated_data: bool,
}

impl DnsAnswer {
    pub fn new(rcode: ResponseCode, answers: Vec<AnswerRecord>) -> Self {
        Self {
            rcode,
            answers,
            negative_ttl: None,
            authenticated_data: false,
        }
    }

    pub fn empty(rcode: ResponseCode) -> Self {
        Self::new(rcode, Vec::new())
    }

    pub fn servfail() -> Self {
        Self::empty(ResponseCode::ServFail)
    }

    pub fn refused() -> Self {
        Self::empty(ResponseCode::Refused)
    }

    pub fn nxdomain() -> Self {
        Self::empty(ResponseCode::NXDomain)
    }

    pub fn is_nodata(&self) -> bool {
        self.rcode == ResponseCode::NoError && self.answers.is_empty()
    }

    /// Smallest TTL in the answer section, or the negative TTL for empty answers.
    pub fn min_ttl(&self) -> Option<u32> {
        self.answers
            .iter()
            .map(|record| record.ttl)
            .min()
            .or(self.negative_ttl)
    }

    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.answers.iter().filter_map(|record| match record.data {
            RecordData::A(ip) => Some(IpAddr::V4(ip)),
            RecordData::Aaaa(ip) => Some(IpAddr::V6(ip)),
            _ => None,
        })
    }

    /// First PTR target, without the trailing root dot.
    pub fn ptr_target(&self) -> Option<&str> {
        self.answers.iter().find_map(|record| match &record.data {
            RecordData::Ptr(target) => Some(target.trim_end_matches('.')),
            _ => None,
        })
    }

    /// Copy with every TTL lowered to at most `ttl`, used when serving from cache.
    pub fn with_ttl_capped(&self, ttl: u32) -> Self {
        let mut answer = self.clone();
        for record in &mut answer.answers {
            record.ttl = record.ttl.min(ttl);
        }
        answer.negative_ttl = answer.negative_ttl.map(|value| value.min(ttl));
        answer
    }
}
