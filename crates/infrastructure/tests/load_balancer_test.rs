mod helpers;

use dnsforward_application::ports::{DnsForwarder, DnsUpstream, QueryOptions};
use dnsforward_domain::{DnsQuery, DomainError, RecordType, UpstreamMode};
use dnsforward_infrastructure::dns::load_balancer::{Strategy, TcpProber, UpstreamPool};
use helpers::{a_answer, MockProber, MockUpstream};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn upstreams(mocks: &[Arc<MockUpstream>]) -> Vec<Arc<dyn DnsUpstream>> {
    mocks
        .iter()
        .map(|m| Arc::clone(m) as Arc<dyn DnsUpstream>)
        .collect()
}

fn pool(mode: UpstreamMode, mocks: &[Arc<MockUpstream>]) -> UpstreamPool {
    UpstreamPool::new(Strategy::from_mode(mode, Arc::new(TcpProber::new())), upstreams(mocks))
}

fn deadline(secs: u64) -> Instant {
    Instant::now() + Duration::from_secs(secs)
}

fn a_query(domain: &str) -> DnsQuery {
    DnsQuery::new(domain, RecordType::A)
}

// ── sequential ──

#[tokio::test(start_paused = true)]
async fn test_sequential_fails_over_in_order() {
    helpers::init_tracing();
    let mocks = [
        Arc::new(MockUpstream::failing("10.0.0.1:53").with_delay(Duration::from_millis(300))),
        Arc::new(MockUpstream::failing("10.0.0.2:53").with_delay(Duration::from_millis(300))),
        Arc::new(MockUpstream::answering(
            "10.0.0.3:53",
            a_answer("example.com", &[[93, 184, 216, 34]], 300),
        )),
    ];
    let pool = pool(UpstreamMode::Sequential, &mocks);

    let start = Instant::now();
    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(10))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.3:53");
    assert!(start.elapsed() >= Duration::from_millis(600));
    assert!(mocks.iter().all(|m| m.calls() == 1));
}

#[tokio::test]
async fn test_sequential_stops_at_first_success() {
    let mocks = [
        Arc::new(MockUpstream::answering(
            "10.0.0.1:53",
            a_answer("example.com", &[[1, 1, 1, 1]], 60),
        )),
        Arc::new(MockUpstream::answering(
            "10.0.0.2:53",
            a_answer("example.com", &[[2, 2, 2, 2]], 60),
        )),
    ];
    let pool = pool(UpstreamMode::Sequential, &mocks);

    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(5))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.1:53");
    assert_eq!(mocks[1].calls(), 0);
}

#[tokio::test]
async fn test_sequential_all_failed() {
    let mocks = [
        Arc::new(MockUpstream::failing("10.0.0.1:53")),
        Arc::new(MockUpstream::failing("10.0.0.2:53")),
    ];
    let pool = pool(UpstreamMode::Sequential, &mocks);

    let err = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(5))
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::TransportAllServersUnreachable);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_fails_over_past_black_holed_upstreams() {
    let mocks = [
        Arc::new(
            MockUpstream::answering("10.0.0.1:53", a_answer("example.com", &[[1, 1, 1, 1]], 60))
                .with_delay(Duration::from_secs(60)),
        ),
        Arc::new(
            MockUpstream::answering("10.0.0.2:53", a_answer("example.com", &[[2, 2, 2, 2]], 60))
                .with_delay(Duration::from_secs(60)),
        ),
        Arc::new(MockUpstream::answering(
            "10.0.0.3:53",
            a_answer("example.com", &[[3, 3, 3, 3]], 60),
        )),
    ];
    let pool = pool(UpstreamMode::Sequential, &mocks);

    let start = Instant::now();
    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(10))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.3:53");
    assert_eq!(
        result.answer.addresses().collect::<Vec<_>>(),
        vec![IpAddr::V4(Ipv4Addr::new(3, 3, 3, 3))]
    );
    assert!(start.elapsed() <= Duration::from_secs(10));
    assert_eq!([mocks[0].calls(), mocks[1].calls(), mocks[2].calls()], [1, 1, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_splits_deadline_between_upstreams() {
    let mocks = [
        Arc::new(MockUpstream::failing("10.0.0.1:53").with_delay(Duration::from_secs(30))),
        Arc::new(MockUpstream::answering(
            "10.0.0.2:53",
            a_answer("example.com", &[[2, 2, 2, 2]], 60),
        )),
    ];
    let pool = pool(UpstreamMode::Sequential, &mocks);

    let start = Instant::now();
    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(2))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.2:53");
    assert!(start.elapsed() <= Duration::from_secs(2));
    assert_eq!(mocks[1].calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_respects_deadline() {
    let mocks = [
        Arc::new(MockUpstream::failing("10.0.0.1:53").with_delay(Duration::from_secs(30))),
        Arc::new(MockUpstream::failing("10.0.0.2:53").with_delay(Duration::from_secs(30))),
    ];
    let pool = pool(UpstreamMode::Sequential, &mocks);

    let start = Instant::now();
    let err = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(2))
        .await
        .unwrap_err();

    assert!(err.is_transport_error());
    assert!(start.elapsed() <= Duration::from_secs(2));
}

#[tokio::test]
async fn test_empty_upstream_list() {
    let pool = pool(UpstreamMode::Sequential, &[]);
    let err = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(1))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::TransportNoHealthyServers);
}

// ── parallel ──

#[tokio::test(start_paused = true)]
async fn test_parallel_does_not_wait_for_slow_failures() {
    let mocks = [
        Arc::new(MockUpstream::failing("10.0.0.1:53").with_delay(Duration::from_secs(3))),
        Arc::new(MockUpstream::failing("10.0.0.2:53").with_delay(Duration::from_secs(3))),
        Arc::new(
            MockUpstream::answering(
                "10.0.0.3:53",
                a_answer("example.com", &[[93, 184, 216, 34]], 300),
            )
                .with_delay(Duration::from_millis(100)),
        ),
    ];
    let pool = pool(UpstreamMode::Parallel, &mocks);

    let start = Instant::now();
    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(10))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.3:53");
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(mocks.iter().all(|m| m.calls() == 1));
}

#[tokio::test(start_paused = true)]
async fn test_parallel_first_answer_wins() {
    let mocks = [
        Arc::new(
            MockUpstream::answering("10.0.0.1:53", a_answer("example.com", &[[1, 1, 1, 1]], 60))
                .with_delay(Duration::from_millis(500)),
        ),
        Arc::new(
            MockUpstream::answering("10.0.0.2:53", a_answer("example.com", &[[2, 2, 2, 2]], 60))
                .with_delay(Duration::from_millis(50)),
        ),
    ];
    let pool = pool(UpstreamMode::Parallel, &mocks);

    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(5))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.2:53");
}

#[tokio::test]
async fn test_parallel_all_failed() {
    let mocks = [
        Arc::new(MockUpstream::failing("10.0.0.1:53")),
        Arc::new(MockUpstream::failing("10.0.0.2:53")),
    ];
    let pool = pool(UpstreamMode::Parallel, &mocks);

    let err = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(5))
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::TransportAllServersUnreachable);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_deadline() {
    let mocks = [Arc::new(
        MockUpstream::answering("10.0.0.1:53", a_answer("example.com", &[[1, 1, 1, 1]], 60))
            .with_delay(Duration::from_secs(60)),
    )];
    let pool = pool(UpstreamMode::Parallel, &mocks);

    let err = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(1))
        .await
        .unwrap_err();

    assert!(err.is_transport_error());
}

// ── fastest_addr ──

fn fastest_pool(prober: Arc<MockProber>, mocks: &[Arc<MockUpstream>]) -> UpstreamPool {
    UpstreamPool::new(
        Strategy::from_mode(UpstreamMode::FastestAddr, prober),
        upstreams(mocks),
    )
}

#[tokio::test(start_paused = true)]
async fn test_fastest_addr_keeps_answer_with_quickest_address() {
    let prober = Arc::new(
        MockProber::new()
            .with_rtt([1, 1, 1, 1], Duration::from_millis(80))
            .with_rtt([2, 2, 2, 2], Duration::from_millis(10)),
    );
    let mocks = [
        Arc::new(MockUpstream::answering(
            "10.0.0.1:53",
            a_answer("example.com", &[[1, 1, 1, 1]], 60),
        )),
        Arc::new(
            MockUpstream::answering("10.0.0.2:53", a_answer("example.com", &[[2, 2, 2, 2]], 60))
                .with_delay(Duration::from_millis(20)),
        ),
    ];
    let pool = fastest_pool(prober.clone(), &mocks);

    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(2))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.2:53");
    assert_eq!(
        result.answer.addresses().collect::<Vec<_>>(),
        vec![IpAddr::V4(Ipv4Addr::new(2, 2, 2, 2))]
    );
    assert_eq!(prober.probes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fastest_addr_probes_each_address_once() {
    let prober = Arc::new(MockProber::new().with_rtt([3, 3, 3, 3], Duration::from_millis(5)));
    let mocks = [
        Arc::new(MockUpstream::answering(
            "10.0.0.1:53",
            a_answer("example.com", &[[1, 1, 1, 1], [3, 3, 3, 3]], 60),
        )),
        Arc::new(MockUpstream::answering(
            "10.0.0.2:53",
            a_answer("example.com", &[[1, 1, 1, 1]], 60),
        )),
    ];
    let pool = fastest_pool(prober.clone(), &mocks);

    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(2))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.1:53");
    assert_eq!(prober.probes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fastest_addr_falls_back_when_no_probe_answers() {
    let prober = Arc::new(MockProber::new());
    let mocks = [
        Arc::new(
            MockUpstream::answering("10.0.0.1:53", a_answer("example.com", &[[1, 1, 1, 1]], 60))
                .with_delay(Duration::from_millis(200)),
        ),
        Arc::new(
            MockUpstream::answering("10.0.0.2:53", a_answer("example.com", &[[2, 2, 2, 2]], 60))
                .with_delay(Duration::from_millis(10)),
        ),
    ];
    let pool = fastest_pool(prober, &mocks);

    let start = Instant::now();
    let result = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(5))
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.2:53");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_fastest_addr_non_address_query_acts_like_parallel() {
    let prober = Arc::new(MockProber::new().with_rtt([1, 1, 1, 1], Duration::from_millis(1)));
    let mocks = [
        Arc::new(
            MockUpstream::answering("10.0.0.1:53", a_answer("example.com", &[[1, 1, 1, 1]], 60))
                .with_delay(Duration::from_millis(400)),
        ),
        Arc::new(
            MockUpstream::answering("10.0.0.2:53", a_answer("example.com", &[[2, 2, 2, 2]], 60))
                .with_delay(Duration::from_millis(20)),
        ),
    ];
    let pool = fastest_pool(prober.clone(), &mocks);

    let start = Instant::now();
    let result = pool
        .forward(
            &DnsQuery::new("example.com", RecordType::MX),
            &QueryOptions::default(),
            deadline(2),
        )
        .await
        .unwrap();

    assert_eq!(&*result.server, "10.0.0.2:53");
    assert!(start.elapsed() < Duration::from_millis(400));
    assert_eq!(prober.probes(), 0);
}

#[tokio::test]
async fn test_fastest_addr_all_failed() {
    let mocks = [Arc::new(MockUpstream::failing("10.0.0.1:53"))];
    let pool = fastest_pool(Arc::new(MockProber::new()), &mocks);

    let err = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(1))
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::TransportAllServersUnreachable);
}

// ── domain routing ──

#[tokio::test]
async fn test_domain_route_takes_subdomains() {
    let default = Arc::new(MockUpstream::answering(
        "10.0.0.1:53",
        a_answer("x", &[[1, 1, 1, 1]], 60),
    ));
    let lan = Arc::new(MockUpstream::answering(
        "192.168.1.1:53",
        a_answer("x", &[[192, 168, 1, 10]], 60),
    ));
    let pool = pool(UpstreamMode::Sequential, &[default.clone()])
        .with_domain_upstreams("lan", upstreams(&[lan.clone()]));

    let routed = pool
        .forward(&a_query("nas.home.lan."), &QueryOptions::default(), deadline(1))
        .await
        .unwrap();
    let unrouted = pool
        .forward(&a_query("example.com"), &QueryOptions::default(), deadline(1))
        .await
        .unwrap();

    assert_eq!(&*routed.server, "192.168.1.1:53");
    assert_eq!(&*unrouted.server, "10.0.0.1:53");
    assert_eq!((default.calls(), lan.calls()), (1, 1));
}

#[tokio::test]
async fn test_domain_route_most_specific_wins() {
    let default = Arc::new(MockUpstream::answering(
        "10.0.0.1:53",
        a_answer("x", &[[1, 1, 1, 1]], 60),
    ));
    let corp = Arc::new(MockUpstream::answering(
        "10.1.0.1:53",
        a_answer("x", &[[10, 1, 0, 2]], 60),
    ));
    let dev = Arc::new(MockUpstream::answering("10.2.0.1:53", a_answer("x", &[[10, 2, 0, 2]], 60)));
    let pool = pool(UpstreamMode::Sequential, &[default])
        .with_domain_upstreams("corp.example", upstreams(&[corp]))
        .with_domain_upstreams("dev.corp.example", upstreams(&[dev]));

    assert_eq!(pool.select("build.dev.corp.example")[0].address(), "10.2.0.1:53");
    assert_eq!(pool.select("www.corp.example")[0].address(), "10.1.0.1:53");
    assert_eq!(pool.select("corp.example")[0].address(), "10.1.0.1:53");
    assert_eq!(pool.select("notcorp.example")[0].address(), "10.0.0.1:53");
}

#[tokio::test]
async fn test_empty_domain_route_uses_default_upstreams() {
    let default = Arc::new(MockUpstream::answering(
        "10.0.0.1:53",
        a_answer("x", &[[1, 1, 1, 1]], 60),
    ));
    let corp = Arc::new(MockUpstream::answering(
        "10.1.0.1:53",
        a_answer("x", &[[10, 1, 0, 2]], 60),
    ));
    let pool = pool(UpstreamMode::Sequential, &[default])
        .with_domain_upstreams("corp.example", upstreams(&[corp]))
        .with_domain_upstreams("public.corp.example", Vec::new());

    assert_eq!(pool.select("www.public.corp.example")[0].address(), "10.0.0.1:53");
    assert_eq!(pool.select("intranet.corp.example")[0].address(), "10.1.0.1:53");
}
