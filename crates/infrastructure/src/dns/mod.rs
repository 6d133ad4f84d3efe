pub mod cache;
pub mod forwarding;
pub mod load_balancer;
pub mod transport;

pub use cache::QueryCache;
pub use load_balancer::{UpstreamBuilder, UpstreamPool};
