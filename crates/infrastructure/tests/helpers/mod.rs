#![allow(dead_code)]

pub mod dns_server_mock;
pub mod mock_upstream;

pub use dns_server_mock::{MockDnsServer, MockReply};
pub use mock_upstream::{a_answer, MockProber, MockUpstream};

/// Routes `tracing` output to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
