//! Transport ↔ supervisor plumbing
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   TransportEvent    ┌──────────────────────┐
//! │ Transport task     │ ──────────────────> │ Supervisor driver    │
//! │ (poll or socket)   │   (label, epoch)    │ applies transitions  │
//! │                    │ <────────────────── │ under the store lock │
//! └────────────────────┘  Directive (reply)  └──────────────────────┘
//! ```
//!
//! Every transport is tagged with the epoch of the `start` that created it.
//! The driver discards events whose epoch is no longer current and answers
//! their decision requests with [`Directive::Stop`].

use crate::mode::{ConnectionMode, TransportKind};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Generation counter of a label's transport
pub type Epoch = u64;

/// What a transport observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// About to dial or fetch
    Attempt,
    /// Poll request completed with a body
    PollSucceeded(String),
    /// Poll request failed
    PollFailed(String),
    /// Socket handshake completed
    SocketOpened,
    /// Socket delivered a payload
    SocketMessage(String),
    /// Socket-level failure (dial, read or write)
    SocketError(String),
    /// Session ended; the supervisor stops handing over outbound text
    SocketDown,
    /// Socket is gone, carrying outbound text it never wrote; the
    /// supervisor decides whether to re-dial
    SocketClosed(Vec<String>),
}

/// Supervisor's answer to a decision request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Wait this long, then run another cycle
    Continue(Duration),
    /// Exit the transport task
    Stop,
}

#[derive(Debug)]
pub struct TransportEvent {
    pub label: String,
    pub epoch: Epoch,
    pub kind: TransportEventKind,
    pub reply: Option<oneshot::Sender<Directive>>,
}

/// A transport task's handle onto the supervisor's event channel
#[derive(Debug, Clone)]
pub struct TransportContext {
    label: String,
    epoch: Epoch,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportContext {
    pub fn new(label: impl Into<String>, epoch: Epoch, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            label: label.into(),
            epoch,
            events,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Report an observation that needs no answer
    pub fn notify(&self, kind: TransportEventKind) {
        let _ = self.events.send(TransportEvent {
            label: self.label.clone(),
            epoch: self.epoch,
            kind,
            reply: None,
        });
    }

    /// Report an observation and wait for the supervisor's decision
    ///
    /// A closed channel or dropped reply means the supervisor is gone, which
    /// is answered as [`Directive::Stop`].
    pub async fn decide(&self, kind: TransportEventKind) -> Directive {
        let (tx, rx) = oneshot::channel();
        let event = TransportEvent {
            label: self.label.clone(),
            epoch: self.epoch,
            kind,
            reply: Some(tx),
        };
        if self.events.send(event).is_err() {
            return Directive::Stop;
        }
        rx.await.unwrap_or(Directive::Stop)
    }
}

/// The supervisor's handle to a label's running transport
///
/// Dropping it tears the transport down: the shutdown sender is dropped,
/// which wakes the task out of any pending fetch, dial or sleep, and the
/// outbound sender closes so a socket flushes what it has and closes.
#[derive(Debug)]
pub struct ActiveTransport {
    pub epoch: Epoch,
    pub kind: TransportKind,
    pub mode: ConnectionMode,
    pub one_shot: bool,
    /// Set once the socket is open and the send buffer has been drained
    pub ready: bool,
    pub(crate) outbound: Option<mpsc::UnboundedSender<String>>,
    _shutdown: oneshot::Sender<()>,
    _handle: JoinHandle<()>,
}

impl ActiveTransport {
    pub(crate) fn new(
        epoch: Epoch,
        kind: TransportKind,
        mode: ConnectionMode,
        one_shot: bool,
        outbound: Option<mpsc::UnboundedSender<String>>,
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            epoch,
            kind,
            mode,
            one_shot,
            ready: false,
            outbound,
            _shutdown: shutdown,
            _handle: handle,
        }
    }

    /// Deliver a message on the duplex channel
    ///
    /// Hands the message back when the transport cannot take it.
    pub(crate) fn deliver(&self, message: String) -> std::result::Result<(), String> {
        match (&self.outbound, self.ready) {
            (Some(tx), true) => tx.send(message).map_err(|e| e.0),
            _ => Err(message),
        }
    }
}
