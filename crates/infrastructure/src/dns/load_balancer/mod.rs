pub mod bootstrap;
pub mod builder;
pub mod fastest;
pub mod parallel;
pub mod pool;
pub mod prober;
pub mod sequential;
pub mod strategy;
pub mod upstream;

pub use bootstrap::Bootstrap;
pub use builder::UpstreamBuilder;
pub use pool::UpstreamPool;
pub use prober::{AddressProber, TcpProber};
pub use strategy::Strategy;
pub use upstream::UpstreamResolver;
