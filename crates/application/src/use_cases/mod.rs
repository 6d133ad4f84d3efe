pub mod clients;
pub mod config;
pub mod dns;

// Re-export use cases
pub use clients::ResolveClientNameUseCase;
pub use config::{GetConfigUseCase, UpdateConfigUseCase};
pub use dns::{HandleDnsQueryUseCase, QueryOutcome, Resolution};
