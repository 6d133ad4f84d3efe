#![allow(dead_code)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// What the mock server answers to every query.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// One A record.
    A(Ipv4Addr, u32),
    /// One PTR record pointing at the given name.
    Ptr(&'static str, u32),
    /// NXDOMAIN with an SOA whose minimum is the given TTL.
    NxDomain(u32),
    /// Empty answer with this RCODE.
    Rcode(u8),
    /// TC bit over UDP; the A record over TCP.
    Truncated(Ipv4Addr, u32),
    /// Valid answer with a different message ID.
    WrongId(Ipv4Addr),
    /// Never answers.
    Silent,
}

/// DNS server on 127.0.0.1 answering UDP and TCP with canned responses.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Vec<u8>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(reply: MockReply) -> Self {
        Self::start_with_delay(reply, Duration::ZERO).await
    }

    pub async fn start_with_delay(reply: MockReply, delay: Duration) -> Self {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = udp.local_addr().unwrap();
        let tcp = TcpListener::bind(addr).await.unwrap();

        let queries = Arc::new(AtomicUsize::new(0));
        let last_query = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let (q, last) = (Arc::clone(&queries), Arc::clone(&last_query));
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = udp.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        q.fetch_add(1, Ordering::SeqCst);
                        *last.lock().unwrap() = buf[..len].to_vec();
                        if let Some(response) = build_response(&buf[..len], &reply, false) {
                            tokio::time::sleep(delay).await;
                            let _ = udp.send_to(&response, peer).await;
                        }
                    }
                    accepted = tcp.accept() => {
                        let Ok((mut stream, _)) = accepted else { continue };
                        let reply = reply.clone();
                        let (q, last) = (Arc::clone(&q), Arc::clone(&last));
                        tokio::spawn(async move {
                            let mut len_buf = [0u8; 2];
                            if stream.read_exact(&mut len_buf).await.is_err() {
                                return;
                            }
                            let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                            if stream.read_exact(&mut query).await.is_err() {
                                return;
                            }
                            q.fetch_add(1, Ordering::SeqCst);
                            *last.lock().unwrap() = query.clone();
                            if let Some(response) = build_response(&query, &reply, true) {
                                tokio::time::sleep(delay).await;
                                let len = (response.len() as u16).to_be_bytes();
                                let _ = stream.write_all(&len).await;
                                let _ = stream.write_all(&response).await;
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            queries,
            last_query,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `127.0.0.1:port`, as written in an upstream list.
    pub fn upstream(&self) -> String {
        self.addr.to_string()
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Vec<u8> {
        self.last_query.lock().unwrap().clone()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// End of the question section of a query.
fn question_end(query: &[u8]) -> Option<usize> {
    let mut pos = 12;
    loop {
        let len = *query.get(pos)? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        pos += len;
    }
    let end = pos + 4;
    (end <= query.len()).then_some(end)
}

fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in name.trim_end_matches('.').split('.') {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

fn record(out: &mut Vec<u8>, rtype: u16, ttl: u32, rdata: &[u8]) {
    out.extend_from_slice(&[0xc0, 0x0c]);
    out.extend_from_slice(&rtype.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&ttl.to_be_bytes());
    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    out.extend_from_slice(rdata);
}

fn build_response(query: &[u8], reply: &MockReply, over_tcp: bool) -> Option<Vec<u8>> {
    let end = question_end(query)?;
    let (mut id, mut flags, mut rcode) = ([query[0], query[1]], 0x81u8, 0u8);
    let (mut answers, mut authority) = (Vec::new(), Vec::new());
    let (mut ancount, mut nscount) = (0u16, 0u16);

    match reply {
        MockReply::Silent => return None,
        MockReply::A(ip, ttl) => {
            record(&mut answers, 1, *ttl, &ip.octets());
            ancount = 1;
        }
        MockReply::Truncated(ip, ttl) => {
            if over_tcp {
                record(&mut answers, 1, *ttl, &ip.octets());
                ancount = 1;
            } else {
                flags |= 0x02;
            }
        }
        MockReply::WrongId(ip) => {
            id = [query[0] ^ 0xff, query[1]];
            record(&mut answers, 1, 60, &ip.octets());
            ancount = 1;
        }
        MockReply::Ptr(target, ttl) => {
            record(&mut answers, 12, *ttl, &encode_name(target));
            ancount = 1;
        }
        MockReply::NxDomain(minimum) => {
            rcode = 3;
            let mut soa = encode_name("ns.example");
            soa.extend(encode_name("hostmaster.example"));
            for value in [1u32, 3600, 600, 86400, *minimum] {
                soa.extend_from_slice(&value.to_be_bytes());
            }
            record(&mut authority, 6, 3600, &soa);
            nscount = 1;
        }
        MockReply::Rcode(code) => rcode = *code,
    }

    let mut response = Vec::with_capacity(512);
    response.extend_from_slice(&id);
    response.push(flags);
    response.push(0x80 | rcode);
    response.extend_from_slice(&1u16.to_be_bytes());
    response.extend_from_slice(&ancount.to_be_bytes());
    response.extend_from_slice(&nscount.to_be_bytes());
    response.extend_from_slice(&0u16.to_be_bytes());
    response.extend_from_slice(&query[12..end]);
    response.extend(answers);
    response.extend(authority);
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_responds() {
        let server = MockDnsServer::start(MockReply::A(Ipv4Addr::new(93, 184, 216, 34), 60)).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let mut query = vec![0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
        query.extend(encode_name("example.com"));
        query.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        client.send_to(&query, server.addr()).await.unwrap();

        let mut buf = vec![0u8; 512];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();

        assert!(len > query.len());
        assert_eq!(buf[0..2], query[0..2]);
        assert_eq!(buf[2] & 0x80, 0x80);
        assert_eq!(server.queries(), 1);
    }
}
