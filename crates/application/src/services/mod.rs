pub mod blocking_synthesizer;
pub mod rate_limiter;

pub use blocking_synthesizer::BlockingSynthesizer;
pub use rate_limiter::RateLimiter;
