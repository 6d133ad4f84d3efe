use thiserror::Error;

/// Rejection of a candidate configuration. The display strings are shown to
/// users verbatim and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("wrong upstreams specification: {cause}")]
    InvalidUpstream { address: String, cause: String },

    #[error("{address} can not be used as bootstrap dns cause: {cause}")]
    InvalidBootstrap { address: String, cause: String },

    #[error("blocking_mode: incorrect value")]
    InvalidBlockingMode,

    #[error("upstream_mode: incorrect value")]
    InvalidUpstreamMode,

    #[error("cache_ttl_min must be less or equal than cache_ttl_max")]
    InvalidCacheTtlRange,

    #[error("ratelimit: must be a non-negative integer")]
    InvalidRateLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
