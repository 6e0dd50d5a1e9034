//! Integration tests for the HTTP polling transport
//!
//! A minimal HTTP responder stands in for the endpoint so the real reqwest
//! source is exercised end to end.

mod common;

use common::{fixtures, wait_until};
use hyperlink::{ConnectionSupervisor, ErrorMode, Phase, TransportKind};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const WAIT: Duration = Duration::from_secs(5);

/// Serves scripted `(status, body)` pairs, repeating the last one forever
struct MockHttpServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockHttpServer {
    async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::from(responses)));

        let requests_clone = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let requests = requests_clone.clone();
                let script = script.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut head = String::new();
                    while !head.contains("\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.push_str(&String::from_utf8_lossy(&buf[..n])),
                        }
                    }
                    requests.lock().push(head);

                    let (status, body) = {
                        let mut script = script.lock();
                        if script.len() > 1 {
                            script.pop_front().unwrap()
                        } else {
                            *script.front().unwrap()
                        }
                    };
                    let reason = if status == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

fn supervisor() -> ConnectionSupervisor {
    ConnectionSupervisor::new(fixtures::fast_config()).unwrap()
}

#[tokio::test]
async fn test_poll_fetches_with_cache_busting() {
    let server = MockHttpServer::start(vec![(200, "price=1"), (200, "price=2")]).await;
    let supervisor = supervisor();

    supervisor.register("quote", server.url("/quote?symbol=abc"));
    assert!(wait_until(WAIT, || supervisor.poll_connected("quote")).await);
    assert!(wait_until(WAIT, || supervisor.latest("quote") == "price=2").await);

    let status = supervisor.status("quote").unwrap();
    assert_eq!(status.transport, Some(TransportKind::Poll));
    assert_eq!(status.messages_received, 2);

    let requests = server.requests();
    assert!(requests.len() >= 2);
    let first_line: Vec<&str> = requests[0].lines().next().unwrap().split(' ').collect();
    assert!(first_line[1].starts_with("/quote?symbol=abc&_t="));
    let second_line = requests[1].lines().next().unwrap().to_string();
    assert_ne!(requests[0].lines().next().unwrap(), second_line);
    assert!(requests[0].to_ascii_lowercase().contains("cache-control: no-store"));
}

#[tokio::test]
async fn test_poll_status_error_halts_in_hat_only() {
    let server = MockHttpServer::start(vec![(200, "ok"), (500, "boom")]).await;
    let supervisor = supervisor();

    supervisor.set_error_mode("quote", ErrorMode::HatOnly);
    supervisor.register("quote", server.url("/quote"));

    assert!(wait_until(WAIT, || supervisor.poll_error("quote")).await);
    assert!(supervisor.poll_disconnected("quote"));
    assert!(wait_until(WAIT, || supervisor.phase("quote") == Phase::Idle).await);

    let seen = server.requests().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.requests().len(), seen);
    assert_eq!(supervisor.latest("quote"), "ok");
}

#[tokio::test]
async fn test_poll_error_recovers_in_auto_reconnect() {
    let server = MockHttpServer::start(vec![(503, ""), (200, "back")]).await;
    let supervisor = supervisor();

    supervisor.register("quote", server.url("/quote"));
    assert!(wait_until(WAIT, || supervisor.poll_error("quote")).await);
    assert!(wait_until(WAIT, || supervisor.latest("quote") == "back").await);
    assert!(supervisor.poll_connected("quote"));
    assert!(supervisor.status("quote").unwrap().reconnect_count >= 1);
}
