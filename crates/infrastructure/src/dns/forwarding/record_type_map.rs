use dnsforward_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

/// Converts between the domain record type and hickory's through the wire value,
/// so types unknown to either side survive the round trip.
pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        HickoryRecordType::from(record_type.to_u16())
    }

    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        RecordType::from_u16(u16::from(hickory_type))
    }
}
