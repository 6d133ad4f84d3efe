use super::record_type_map::RecordTypeMapper;
use dnsforward_domain::{AnswerRecord, DnsAnswer, DomainError, RecordData, ResponseCode};
use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use hickory_proto::serialize::binary::BinEncodable;
use std::sync::Arc;
use tracing::debug;

const FLAG_TRUNCATED: u8 = 0x02;
const FLAG_AUTHENTIC_DATA: u8 = 0x20;
const FLAG_RESPONSE: u8 = 0x80;

/// A decoded upstream response.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub id: u16,
    pub truncated: bool,
    pub answer: DnsAnswer,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Decodes a wire response. Header bits are read from the raw bytes,
    /// records through hickory.
    pub fn parse(response_bytes: &[u8]) -> Result<ParsedResponse, DomainError> {
        if response_bytes.len() < 12 {
            return Err(DomainError::InvalidDnsResponse(format!(
                "response too short: {} bytes",
                response_bytes.len()
            )));
        }
        if response_bytes[2] & FLAG_RESPONSE == 0 {
            return Err(DomainError::InvalidDnsResponse(
                "QR bit not set".to_string(),
            ));
        }

        let id = u16::from_be_bytes([response_bytes[0], response_bytes[1]]);
        let truncated = response_bytes[2] & FLAG_TRUNCATED != 0;
        let authenticated_data = response_bytes[3] & FLAG_AUTHENTIC_DATA != 0;
        let rcode = ResponseCode::from_u16(u16::from(response_bytes[3] & 0x0F));

        if truncated {
            return Ok(ParsedResponse {
                id,
                truncated,
                answer: DnsAnswer::empty(rcode),
            });
        }

        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let mut answers = Vec::with_capacity(message.answers().len());
        for record in message.answers() {
            let name: Arc<str> = Arc::from(record.name().to_utf8().trim_end_matches('.'));
            let ttl = record.ttl();
            let data = match record.data() {
                RData::A(a) => RecordData::A(a.0),
                RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
                RData::CNAME(canonical) => RecordData::Cname(Arc::from(canonical.to_utf8())),
                RData::PTR(ptr) => RecordData::Ptr(Arc::from(ptr.to_utf8())),
                other => {
                    let rdata = other.to_bytes().map_err(|e| {
                        DomainError::InvalidDnsResponse(format!("Failed to encode rdata: {}", e))
                    })?;
                    answers.push(AnswerRecord::opaque(
                        name,
                        RecordTypeMapper::from_hickory(record.record_type()),
                        ttl,
                        rdata,
                    ));
                    continue;
                }
            };
            answers.push(AnswerRecord::new(name, ttl, data));
        }

        let negative_ttl = message.name_servers().iter().find_map(|r| match r.data() {
            RData::SOA(soa) => Some(soa.minimum().min(r.ttl())),
            _ => None,
        });

        debug!(
            rcode = %rcode,
            answers = answers.len(),
            negative_ttl = ?negative_ttl,
            "DNS response parsed"
        );

        let mut answer = DnsAnswer::new(rcode, answers);
        answer.negative_ttl = negative_ttl;
        answer.authenticated_data = authenticated_data;

        Ok(ParsedResponse {
            id,
            truncated,
            answer,
        })
    }
}
