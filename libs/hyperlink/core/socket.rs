//! Persistent socket transport
//!
//! One task per label drives a tokio-tungstenite connection through
//! dial → open → message loop → close, and asks the supervisor after every
//! close whether to re-dial. Outbound text arrives on an unbounded channel
//! that the supervisor only feeds once the socket is reported open; text
//! that never reached the wire is handed back with the close.

use crate::error::HyperLinkError;
use crate::transport::{Directive, TransportContext, TransportEventKind};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// How a connected session ended
enum SessionEnd {
    /// Remote closed or the stream ended
    Closed,
    /// Read or write failure, with the outbound text that was being written
    Failed(HyperLinkError, Option<String>),
    /// Torn down by the supervisor
    Shutdown,
}

/// Socket transport task body
pub(crate) async fn run_socket_transport(
    ctx: TransportContext,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: oneshot::Receiver<()>,
) {
    debug!("[{}] Socket transport started (epoch {})", ctx.label(), ctx.epoch());

    loop {
        ctx.notify(TransportEventKind::Attempt);

        let mut unsent = Vec::new();

        let connection = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = connect_async(url.as_str()) => result,
        };

        match connection {
            Ok((ws_stream, _)) => {
                info!("[{}] Connected to {}", ctx.label(), url);
                ctx.notify(TransportEventKind::SocketOpened);

                match session(&ctx, ws_stream, &mut outbound, &mut shutdown).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Closed => debug!("[{}] Socket closed by remote", ctx.label()),
                    SessionEnd::Failed(e, message) => {
                        warn!("[{}] Socket error: {}", ctx.label(), e);
                        ctx.notify(TransportEventKind::SocketError(e.to_string()));
                        unsent.extend(message);
                    }
                }

                // Once acknowledged, nothing new enters the outbound channel
                let down = tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    directive = ctx.decide(TransportEventKind::SocketDown) => directive,
                };
                if down == Directive::Stop {
                    break;
                }
                while let Ok(text) = outbound.try_recv() {
                    unsent.push(text);
                }
                if !unsent.is_empty() {
                    debug!("[{}] Returning {} undelivered messages", ctx.label(), unsent.len());
                }
            }
            Err(e) => {
                warn!("[{}] Failed to connect to {}: {}", ctx.label(), url, e);
                ctx.notify(TransportEventKind::SocketError(e.to_string()));
            }
        }

        let delay = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            directive = ctx.decide(TransportEventKind::SocketClosed(unsent)) => match directive {
                Directive::Continue(delay) => delay,
                Directive::Stop => break,
            },
        };

        info!("[{}] Reconnecting in {:?}", ctx.label(), delay);
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!("[{}] Socket transport exiting (epoch {})", ctx.label(), ctx.epoch());
}

/// Pump one open connection until it ends
async fn session(
    ctx: &TransportContext,
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    shutdown: &mut oneshot::Receiver<()>,
) -> SessionEnd {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        ctx.notify(TransportEventKind::SocketMessage(text));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        ctx.notify(TransportEventKind::SocketMessage(text));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("[{}] Close frame received: {:?}", ctx.label(), frame);
                        return SessionEnd::Closed;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Err(e)) => return SessionEnd::Failed(e.into(), None),
                    None => return SessionEnd::Closed,
                }
            }

            message = outbound.recv() => {
                match message {
                    Some(text) => {
                        if let Err(e) = write.send(Message::Text(text.clone())).await {
                            return SessionEnd::Failed(e.into(), Some(text));
                        }
                    }
                    None => {
                        let _ = write.close().await;
                        return SessionEnd::Shutdown;
                    }
                }
            }

            _ = &mut *shutdown => {
                // Flush whatever was handed over before the teardown
                while let Ok(text) = outbound.try_recv() {
                    if write.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = write.close().await;
                return SessionEnd::Shutdown;
            }
        }
    }
}
