//! Common test utilities for HyperLink integration tests
//!
//! Provides a local WebSocket server that records what clients send and lets
//! tests push frames or drop every open connection.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use hyperlink::PollSource;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

#[derive(Debug, Clone)]
enum ServerCommand {
    Push(String),
    DropClients,
}

#[derive(Default)]
struct ServerLog {
    received: Mutex<Vec<String>>,
    accepted: AtomicUsize,
    open: AtomicUsize,
}

/// A mock WebSocket server for testing
pub struct MockWsServer {
    pub addr: SocketAddr,
    log: Arc<ServerLog>,
    commands: broadcast::Sender<ServerCommand>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let log = Arc::new(ServerLog::default());
        let (commands, _) = broadcast::channel(64);

        let shutdown_clone = shutdown.clone();
        let log_clone = log.clone();
        let commands_clone = commands.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let log = log_clone.clone();
                                let commands = commands_clone.subscribe();
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, log, commands, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            log,
            commands,
            shutdown,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        log: Arc<ServerLog>,
        mut commands: broadcast::Receiver<ServerCommand>,
        shutdown: Arc<Notify>,
    ) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        log.accepted.fetch_add(1, Ordering::SeqCst);
        log.open.fetch_add(1, Ordering::SeqCst);
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            log.received.lock().push(text);
                        }
                        Some(Ok(msg)) if msg.is_ping() => {
                            if write.send(Message::Pong(msg.into_data())).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(msg)) if msg.is_close() => break,
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    }
                }
                command = commands.recv() => {
                    match command {
                        Ok(ServerCommand::Push(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Ok(ServerCommand::DropClients) | Err(_) => {
                            let _ = write.close().await;
                            break;
                        }
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }

        log.open.fetch_sub(1, Ordering::SeqCst);
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send a text frame to every open connection
    pub fn push(&self, text: &str) {
        let _ = self.commands.send(ServerCommand::Push(text.to_string()));
    }

    /// Close every open connection from the server side
    pub fn drop_clients(&self) {
        let _ = self.commands.send(ServerCommand::DropClients);
    }

    /// Text frames received from clients, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.log.received.lock().clone()
    }

    /// Completed handshakes since start
    pub fn accepted(&self) -> usize {
        self.log.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently open
    pub fn open_connections(&self) -> usize {
        self.log.open.load(Ordering::SeqCst)
    }

}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown.notify_waiters();
    }
}

/// Poll source whose fetches never complete
///
/// Keeps polling labels quiet in tests that only exercise sockets.
pub struct IdlePollSource;

#[async_trait]
impl PollSource for IdlePollSource {
    async fn fetch(&self, _url: &str) -> hyperlink::Result<String> {
        std::future::pending().await
    }
}

/// An address nothing is listening on
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Test fixtures for supervisor configuration
pub mod fixtures {
    use hyperlink::SupervisorConfig;

    /// Short delays so reconnection paths run quickly under real time
    pub fn fast_config() -> SupervisorConfig {
        SupervisorConfig {
            poll_interval_ms: 50,
            error_backoff_ms: 50,
            reconnect_delay_ms: 100,
            request_timeout_secs: 2,
            ..SupervisorConfig::default()
        }
    }
}
