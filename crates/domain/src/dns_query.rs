use super::RecordType;
use std::sync::Arc;

/// DNS class IN.
pub const CLASS_IN: u16 = 1;

/// Parsed DNS question (name + type + class).
/// Uses `Arc<str>` so the name is shared between engine, cache key and upstream tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub query_class: u16,
}

impl DnsQuery {
    pub fn new(domain: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            record_type,
            query_class: CLASS_IN,
        }
    }

    /// Lowercased name without the trailing root dot.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.domain)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
