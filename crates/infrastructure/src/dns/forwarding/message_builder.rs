//! DNS Message Builder
//!
//! Builds the question with `hickory-proto`, then appends the EDNS(0) OPT
//! pseudo-record by hand so the DO bit and the Client Subnet option are
//! encoded exactly as sent.

use super::record_type_map::RecordTypeMapper;
use dnsforward_application::ports::QueryOptions;
use dnsforward_domain::{ClientSubnet, DnsQuery, DomainError};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// UDP payload size advertised in the OPT record.
pub const EDNS_UDP_PAYLOAD: u16 = 4096;

const OPT_RECORD_TYPE: u16 = 41;
const DNSSEC_OK_FLAG: u16 = 0x8000;
const ECS_OPTION_CODE: u16 = 8;
const ARCOUNT_OFFSET: usize = 10;

/// Wire bytes of a query plus the ID the response must echo.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub id: u16,
    pub bytes: Vec<u8>,
}

pub struct MessageBuilder;

impl MessageBuilder {
    /// Builds a recursive query with a random ID. An OPT record is added
    /// when `options` asks for DNSSEC records or carries a client subnet.
    pub fn build_query(
        query: &DnsQuery,
        options: &QueryOptions,
    ) -> Result<BuiltQuery, DomainError> {
        let name = Name::from_str(&query.domain).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", query.domain, e))
        })?;

        let mut question = Query::new();
        question.set_name(name);
        question.set_query_type(RecordTypeMapper::to_hickory(&query.record_type));
        question.set_query_class(DNSClass::from(query.query_class));

        let id = fastrand::u16(..);
        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(question);

        let mut bytes = Self::serialize_message(&message)?;
        if options.dnssec_ok || options.client_subnet.is_some() {
            Self::append_opt(&mut bytes, options.dnssec_ok, options.client_subnet.as_ref())?;
        }

        Ok(BuiltQuery { id, bytes })
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }

    fn append_opt(
        bytes: &mut Vec<u8>,
        dnssec_ok: bool,
        subnet: Option<&ClientSubnet>,
    ) -> Result<(), DomainError> {
        if bytes.len() < 12 {
            return Err(DomainError::InvalidDnsResponse(
                "serialized query has no header".to_string(),
            ));
        }

        let mut rdata = Vec::new();
        if let Some(subnet) = subnet {
            let address = subnet.wire_address();
            rdata.extend_from_slice(&ECS_OPTION_CODE.to_be_bytes());
            rdata.extend_from_slice(&(4 + address.len() as u16).to_be_bytes());
            rdata.extend_from_slice(&subnet.family().to_be_bytes());
            rdata.push(subnet.prefix());
            rdata.push(0);
            rdata.extend_from_slice(&address);
        }

        let flags = if dnssec_ok { DNSSEC_OK_FLAG } else { 0 };

        bytes.push(0);
        bytes.extend_from_slice(&OPT_RECORD_TYPE.to_be_bytes());
        bytes.extend_from_slice(&EDNS_UDP_PAYLOAD.to_be_bytes());
        // extended rcode, version, flags
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&flags.to_be_bytes());
        bytes.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&rdata);

        let arcount = u16::from_be_bytes([bytes[ARCOUNT_OFFSET], bytes[ARCOUNT_OFFSET + 1]]);
        bytes[ARCOUNT_OFFSET..ARCOUNT_OFFSET + 2].copy_from_slice(&(arcount + 1).to_be_bytes());
        Ok(())
    }
}
