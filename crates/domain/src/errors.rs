use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Transport connection reset by {server}")]
    TransportConnectionReset { server: String },

    #[error("Transport error talking to {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("Upstream {server} answered {rcode}")]
    UpstreamRcode { server: String, rcode: String },

    #[error("No upstream servers configured")]
    TransportNoHealthyServers,

    #[error("All upstream servers unreachable")]
    TransportAllServersUnreachable,

    #[error("Unsupported upstream protocol: {0}")]
    UnsupportedProtocol(String),
}

impl DomainError {
    /// Whether the error came from the network rather than from the answer itself.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            DomainError::TransportTimeout { .. }
                | DomainError::TransportConnectionRefused { .. }
                | DomainError::TransportConnectionReset { .. }
                | DomainError::Transport { .. }
                | DomainError::TransportNoHealthyServers
                | DomainError::TransportAllServersUnreachable
                | DomainError::QueryTimeout
                | DomainError::IoError(_)
        )
    }
}
