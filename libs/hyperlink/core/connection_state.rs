use crate::mode::{ConnectionMode, ErrorMode, TransportKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Lifecycle phase of a label's connection
///
/// ```text
/// Idle → Connecting → Connected → Disconnected → Reconnecting → Connecting
///                                              ↘ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

impl Phase {
    /// A transport is running or about to retry
    pub fn is_active(self) -> bool {
        !matches!(self, Phase::Idle)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Connecting => "connecting",
            Phase::Connected => "connected",
            Phase::Disconnected => "disconnected",
            Phase::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

/// Per-label connection state, written only by the supervisor
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    pub phase: Phase,
    pub connected: bool,
    /// Suppresses automatic reconnection until the next register/set_mode
    pub manual_disconnect: bool,
    /// Last accepted payload, used for poll diffing
    pub last_payload: Option<String>,
    /// Payload returned by `latest`; cleared only by explicit disconnect
    pub latest_payload: String,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    /// Consecutive failures since the last successful connect
    pub failed_attempts: usize,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    /// Accept a polled body as the newest data
    ///
    /// Returns `false` when the body is blank or identical to the last
    /// accepted one, in which case nothing changes.
    pub fn accept_polled(&mut self, body: &str) -> bool {
        if self.last_payload.as_deref() == Some(body) {
            return false;
        }
        self.accept_pushed(body)
    }

    /// Accept a server-pushed payload; only blank payloads are rejected
    pub fn accept_pushed(&mut self, payload: &str) -> bool {
        if payload.is_empty() {
            return false;
        }
        self.latest_payload = payload.to_string();
        self.last_payload = Some(payload.to_string());
        self.messages_received += 1;
        self.last_message_at = Some(Utc::now());
        true
    }

    /// Mark the transport ready; returns `true` on the not-connected → connected edge
    pub fn mark_connected(&mut self) -> bool {
        self.phase = Phase::Connected;
        self.failed_attempts = 0;
        !std::mem::replace(&mut self.connected, true)
    }

    /// Drop the connected flag; returns `true` if it was set
    pub fn mark_disconnected(&mut self) -> bool {
        let was_connected = std::mem::replace(&mut self.connected, false);
        if was_connected {
            self.phase = Phase::Disconnected;
        }
        was_connected
    }
}

/// Read-only snapshot of one label
#[derive(Debug, Clone, Serialize)]
pub struct LabelStatus {
    pub label: String,
    pub url: Option<String>,
    pub mode: Option<ConnectionMode>,
    pub transport: Option<TransportKind>,
    pub error_mode: ErrorMode,
    pub phase: Phase,
    pub connected: bool,
    pub manual_disconnect: bool,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub pending_sends: usize,
    pub last_message_at: Option<DateTime<Utc>>,
}
