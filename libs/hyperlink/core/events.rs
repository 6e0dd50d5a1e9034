//! Edge-triggered event queue
//!
//! Network events arrive asynchronously while the host samples state once
//! per tick. Each `(kind, label)` pair is a presence bit: emitting sets it,
//! polling reads and clears it. Several occurrences before the next sample
//! collapse into one observation; none is ever lost.

use crate::notifier::HostNotifier;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Lifecycle event kinds observable by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connected,
    MessageReceived,
    Disconnected,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Connected,
        EventKind::MessageReceived,
        EventKind::Disconnected,
        EventKind::Error,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Connected => "connected",
            EventKind::MessageReceived => "message_received",
            EventKind::Disconnected => "disconnected",
            EventKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// Deduplicated pending set of `(kind, label)` occurrences
pub struct EventEdgeQueue {
    pending: Mutex<HashSet<(EventKind, String)>>,
    notifier: Arc<dyn HostNotifier>,
}

impl EventEdgeQueue {
    pub fn new(notifier: Arc<dyn HostNotifier>) -> Self {
        Self {
            pending: Mutex::new(HashSet::new()),
            notifier,
        }
    }

    /// Record an occurrence and ask the host to re-sample
    pub fn emit(&self, kind: EventKind, label: &str) {
        let inserted = self.pending.lock().insert((kind, label.to_string()));
        if inserted {
            tracing::debug!("[{}] event {}", label, kind);
        }
        self.notifier.request_resample();
    }

    /// Edge-triggered read: `true` exactly once per collapsed occurrence
    pub fn poll(&self, kind: EventKind, label: &str) -> bool {
        self.pending.lock().remove(&(kind, label.to_string()))
    }

    /// Check without consuming
    pub fn is_pending(&self, kind: EventKind, label: &str) -> bool {
        self.pending.lock().contains(&(kind, label.to_string()))
    }

    /// Number of unobserved occurrences across all labels
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}
