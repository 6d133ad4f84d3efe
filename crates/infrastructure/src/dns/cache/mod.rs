pub mod data;
pub mod eviction;
pub mod storage;

pub use data::CachedAnswer;
pub use eviction::FifoOrder;
pub use storage::QueryCache;
