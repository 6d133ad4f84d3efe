//! Forwarding configuration
//!
//! - `dns`: the published configuration model and its defaults
//! - `upstream`: upstream mode and upstream/bootstrap address lists
//! - `blocking`: blocking mode
//! - `patch`: partial updates and the unvalidated candidate they overlay
//! - `validation`: candidate → configuration, checks in a fixed order
//! - `errors`: validation taxonomy and configuration errors

pub mod blocking;
pub mod dns;
pub mod errors;
pub mod patch;
pub mod upstream;
pub mod validation;

pub use blocking::BlockingMode;
pub use dns::DnsConfig;
pub use errors::{ConfigError, ValidationError};
pub use patch::{ConfigCandidate, DnsConfigPatch};
pub use upstream::{
    matches_domain, parse_bootstrap, DomainUpstreams, UpstreamMode, UpstreamSet,
};
pub use validation::validate;
