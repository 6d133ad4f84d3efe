pub mod config;
pub mod dns;
pub mod system;
