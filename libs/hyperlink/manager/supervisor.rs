use crate::config::SupervisorConfig;
use crate::connection_state::{ConnectionState, LabelStatus, Phase};
use crate::events::{EventEdgeQueue, EventKind};
use crate::mode::{ConnectionMode, ErrorMode, TransportKind};
use crate::poll::{run_poll_transport, CacheBuster};
use crate::poll_source::PollSource;
use crate::reconnect::{strategy_for, ReconnectionStrategy};
use crate::registry::{EndpointRegistry, Label};
use crate::send_buffer::SendBuffer;
use crate::socket::run_socket_transport;
use crate::transport::{
    ActiveTransport, Directive, Epoch, TransportContext, TransportEvent, TransportEventKind,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything the supervisor knows about one label
#[derive(Debug, Default)]
struct LabelRecord {
    state: ConnectionState,
    outbox: SendBuffer,
    epoch: Epoch,
    mode: Option<ConnectionMode>,
    transport: Option<ActiveTransport>,
}

impl LabelRecord {
    /// Drop the running transport and invalidate its pending events
    fn teardown(&mut self) {
        self.epoch += 1;
        if let Some(transport) = self.transport.take() {
            debug!("Tearing down {:?} transport (epoch {})", transport.kind, transport.epoch);
        }
    }
}

/// Single keyed store: registry plus per-label aggregate records
#[derive(Debug, Default)]
struct ConnectionStore {
    registry: EndpointRegistry,
    records: HashMap<Label, LabelRecord>,
}

pub(crate) struct Shared {
    store: Mutex<ConnectionStore>,
    events: EventEdgeQueue,
    config: SupervisorConfig,
    poll_source: Arc<dyn PollSource>,
    tokens: Arc<CacheBuster>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    runtime: Handle,
    closed: AtomicBool,
}

/// Multiplexed connection supervisor
///
/// Owns one record per label: its endpoint, connection state, send buffer
/// and at most one running transport. All public operations are
/// synchronous and never fail; transport problems surface as
/// [`EventKind::Error`] occurrences read through the `poll_*` predicates.
///
/// Transports run as tokio tasks and report to a single driver task, which
/// applies state transitions in arrival order under the store lock.
pub struct ConnectionSupervisor {
    shared: Arc<Shared>,
    driver: JoinHandle<()>,
}

impl ConnectionSupervisor {
    pub(crate) fn from_parts(
        config: SupervisorConfig,
        poll_source: Arc<dyn PollSource>,
        events: EventEdgeQueue,
        runtime: Handle,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            store: Mutex::new(ConnectionStore::default()),
            events,
            config,
            poll_source,
            tokens: Arc::new(CacheBuster::new()),
            event_tx,
            runtime,
            closed: AtomicBool::new(false),
        });

        let driver = shared.runtime.spawn(run_driver(Arc::downgrade(&shared), event_rx));

        Self { shared, driver }
    }

    /// Register `url` under `label` and connect in [`ConnectionMode::Auto`]
    ///
    /// Clears a previous manual disconnect. Any transport already running
    /// for the label is replaced.
    pub fn register(&self, label: &str, url: impl Into<String>) {
        self.register_with_mode(label, url, ConnectionMode::Auto);
    }

    /// Register `url` under `label` and connect directly in `mode`
    pub fn register_with_mode(&self, label: &str, url: impl Into<String>, mode: ConnectionMode) {
        let url = url.into();
        info!("[{}] Registered {}", label, url);
        {
            let mut store = self.shared.store.lock();
            store.registry.register(label, url);
        }
        self.start(label, mode);
    }

    /// Restart `label` in `mode`; no-op if the label has no URL
    pub fn set_mode(&self, label: &str, mode: ConnectionMode) {
        self.start(label, mode);
    }

    /// Set the error policy; applies from the next reconnection decision
    pub fn set_error_mode(&self, label: &str, mode: ErrorMode) {
        debug!("[{}] Error mode set to {}", label, mode);
        self.shared.store.lock().registry.set_error_mode(label, mode);
    }

    fn start(&self, label: &str, mode: ConnectionMode) {
        if self.shared.closed.load(Ordering::Acquire) {
            warn!("[{}] Ignoring start: supervisor is shut down", label);
            return;
        }

        let mut store = self.shared.store.lock();
        let ConnectionStore { registry, records } = &mut *store;

        let Some(url) = registry.lookup(label) else {
            debug!("[{}] Ignoring start: label not registered", label);
            return;
        };
        let resolved = mode.resolve(url);

        let record = records.entry(label.to_string()).or_default();
        record.teardown();

        record.mode = Some(mode);
        record.state.connected = false;
        record.state.manual_disconnect = false;
        record.state.failed_attempts = 0;
        record.state.phase = Phase::Connecting;
        if resolved.one_shot {
            // The single result must be observable even if it repeats the last one
            record.state.last_payload = None;
        }

        let ctx = TransportContext::new(label, record.epoch, self.shared.event_tx.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let transport = match resolved.kind {
            TransportKind::Poll => {
                let handle = self.shared.runtime.spawn(run_poll_transport(
                    ctx,
                    Arc::clone(&self.shared.poll_source),
                    Arc::clone(&self.shared.tokens),
                    resolved.url.clone(),
                    shutdown_rx,
                ));
                ActiveTransport::new(
                    record.epoch,
                    TransportKind::Poll,
                    mode,
                    resolved.one_shot,
                    None,
                    shutdown_tx,
                    handle,
                )
            }
            TransportKind::Socket => {
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                let handle = self.shared.runtime.spawn(run_socket_transport(
                    ctx,
                    resolved.url.clone(),
                    out_rx,
                    shutdown_rx,
                ));
                ActiveTransport::new(
                    record.epoch,
                    TransportKind::Socket,
                    mode,
                    resolved.one_shot,
                    Some(out_tx),
                    shutdown_tx,
                    handle,
                )
            }
        };

        info!(
            "[{}] Starting {:?} transport for {} (mode {}, epoch {})",
            label, resolved.kind, resolved.url, mode, record.epoch
        );
        record.transport = Some(transport);
    }

    /// Send `message` on the label's socket, or buffer it until one is ready
    ///
    /// Polling transports have no duplex channel, so messages for them stay
    /// buffered until the label runs a socket.
    pub fn send(&self, label: &str, message: impl Into<String>) {
        let message = message.into();
        let mut store = self.shared.store.lock();
        let record = store.records.entry(label.to_string()).or_default();

        let message = match record.transport.as_ref() {
            Some(transport) => match transport.deliver(message) {
                Ok(()) => {
                    record.state.messages_sent += 1;
                    return;
                }
                Err(message) => message,
            },
            None => message,
        };

        debug!("[{}] Buffering outbound message ({} pending)", label, record.outbox.len() + 1);
        record.outbox.enqueue(message);
    }

    /// Manually disconnect `label`
    ///
    /// Suppresses automatic reconnection until the next `register` or
    /// `set_mode`, and clears the latest payload.
    pub fn disconnect(&self, label: &str) {
        let mut store = self.shared.store.lock();
        let ConnectionStore { registry, records } = &mut *store;

        if !registry.is_registered(label) {
            debug!("[{}] Ignoring disconnect: label not registered", label);
            return;
        }

        let record = records.entry(label.to_string()).or_default();
        record.state.manual_disconnect = true;
        record.teardown();
        record.state.connected = false;
        record.state.phase = Phase::Idle;
        record.state.latest_payload.clear();
        record.state.last_payload = None;

        drop(store);

        info!("[{}] Disconnected by caller", label);
        self.shared.events.emit(EventKind::Disconnected, label);
    }

    /// Latest payload for `label`, or an empty string
    pub fn latest(&self, label: &str) -> String {
        self.shared
            .store
            .lock()
            .records
            .get(label)
            .map(|record| record.state.latest_payload.clone())
            .unwrap_or_default()
    }

    pub fn poll_event(&self, kind: EventKind, label: &str) -> bool {
        self.shared.events.poll(kind, label)
    }

    pub fn poll_connected(&self, label: &str) -> bool {
        self.poll_event(EventKind::Connected, label)
    }

    pub fn poll_message_received(&self, label: &str) -> bool {
        self.poll_event(EventKind::MessageReceived, label)
    }

    pub fn poll_error(&self, label: &str) -> bool {
        self.poll_event(EventKind::Error, label)
    }

    pub fn poll_disconnected(&self, label: &str) -> bool {
        self.poll_event(EventKind::Disconnected, label)
    }

    /// Current phase of `label`, `Idle` if unknown
    pub fn phase(&self, label: &str) -> Phase {
        self.shared
            .store
            .lock()
            .records
            .get(label)
            .map(|record| record.state.phase)
            .unwrap_or_default()
    }

    /// Snapshot of a registered label
    pub fn status(&self, label: &str) -> Option<LabelStatus> {
        let store = self.shared.store.lock();
        let config = store.registry.config(label)?;
        let record = store.records.get(label);

        let state = record.map(|r| &r.state);
        Some(LabelStatus {
            label: config.label,
            url: Some(config.url),
            mode: record.and_then(|r| r.mode),
            transport: record.and_then(|r| r.transport.as_ref()).map(|t| t.kind),
            error_mode: config.error_mode,
            phase: state.map(|s| s.phase).unwrap_or_default(),
            connected: state.map(|s| s.connected).unwrap_or(false),
            manual_disconnect: state.map(|s| s.manual_disconnect).unwrap_or(false),
            messages_sent: state.map(|s| s.messages_sent).unwrap_or(0),
            messages_received: state.map(|s| s.messages_received).unwrap_or(0),
            reconnect_count: state.map(|s| s.reconnect_count).unwrap_or(0),
            pending_sends: record.map(|r| r.outbox.len()).unwrap_or(0),
            last_message_at: state.and_then(|s| s.last_message_at),
        })
    }

    /// All registered labels, sorted
    pub fn labels(&self) -> Vec<Label> {
        self.shared.store.lock().registry.labels()
    }

    /// Number of labels with a running transport
    pub fn active_count(&self) -> usize {
        self.shared
            .store
            .lock()
            .records
            .values()
            .filter(|record| record.transport.is_some())
            .count()
    }

    /// Tear down every transport and stop the driver, without emitting events
    ///
    /// Later `register` and `set_mode` calls are ignored; reads keep
    /// returning the last known state.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Shutting down connection supervisor");
        {
            let mut store = self.shared.store.lock();
            for record in store.records.values_mut() {
                record.teardown();
                record.state.connected = false;
                record.state.phase = Phase::Idle;
            }
        }
        self.driver.abort();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

/// Driver task: applies transport events in arrival order
async fn run_driver(shared: Weak<Shared>, mut event_rx: mpsc::UnboundedReceiver<TransportEvent>) {
    debug!("Supervisor driver started");

    while let Some(event) = event_rx.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.apply(event);
    }

    debug!("Supervisor driver stopped");
}

impl Shared {
    fn apply(&self, event: TransportEvent) {
        let TransportEvent {
            label,
            epoch,
            kind,
            reply,
        } = event;

        let mut emitted = Vec::new();
        let directive = {
            let mut store = self.store.lock();
            let ConnectionStore { registry, records } = &mut *store;
            let error_mode = registry.error_mode(&label);

            match records.get_mut(&label) {
                Some(record) if record.epoch == epoch && record.transport.is_some() => {
                    self.transition(&label, record, error_mode, kind, &mut emitted)
                }
                _ => {
                    debug!("[{}] Discarding stale {:?} (epoch {})", label, kind, epoch);
                    Directive::Stop
                }
            }
        };

        // Emitted outside the store lock: the host notifier may call back in
        for kind in emitted {
            self.events.emit(kind, &label);
        }

        if let Some(reply) = reply {
            let _ = reply.send(directive);
        }
    }

    fn transition(
        &self,
        label: &str,
        record: &mut LabelRecord,
        error_mode: ErrorMode,
        kind: TransportEventKind,
        emitted: &mut Vec<EventKind>,
    ) -> Directive {
        let (transport_kind, one_shot) = match record.transport.as_ref() {
            Some(transport) => (transport.kind, transport.one_shot),
            None => return Directive::Stop,
        };

        match kind {
            TransportEventKind::Attempt => {
                if record.state.phase == Phase::Reconnecting {
                    record.state.phase = Phase::Connecting;
                }
                Directive::Continue(Duration::ZERO)
            }

            TransportEventKind::PollSucceeded(body) => {
                if record.state.mark_connected() {
                    info!("[{}] Poll endpoint reachable", label);
                    emitted.push(EventKind::Connected);
                }
                if record.state.accept_polled(&body) {
                    emitted.push(EventKind::MessageReceived);
                }

                if one_shot && !body.is_empty() {
                    debug!("[{}] One-shot poll complete", label);
                    record.teardown();
                    record.state.connected = false;
                    record.state.phase = Phase::Idle;
                    return Directive::Stop;
                }
                Directive::Continue(self.config.poll_interval())
            }

            TransportEventKind::PollFailed(reason) => {
                debug!("[{}] Poll failure: {}", label, reason);
                emitted.push(EventKind::Error);
                if record.state.mark_disconnected() {
                    emitted.push(EventKind::Disconnected);
                }
                self.retry_or_halt(label, record, transport_kind, one_shot, error_mode)
            }

            TransportEventKind::SocketOpened => {
                if record.state.mark_connected() {
                    emitted.push(EventKind::Connected);
                }

                let pending = record.outbox.drain();
                if let Some(transport) = record.transport.as_mut() {
                    transport.ready = true;
                    let flushed = pending.len();
                    for message in pending {
                        if let Err(message) = transport.deliver(message) {
                            // Transport vanished mid-flush; keep the rest for the next open
                            record.outbox.enqueue(message);
                            continue;
                        }
                        record.state.messages_sent += 1;
                    }
                    if flushed > 0 {
                        debug!("[{}] Flushed {} buffered messages", label, flushed);
                    }
                }
                Directive::Continue(Duration::ZERO)
            }

            TransportEventKind::SocketMessage(text) => {
                if !record.state.accept_pushed(&text) {
                    debug!("[{}] Ignoring blank socket message", label);
                    return Directive::Continue(Duration::ZERO);
                }
                emitted.push(EventKind::MessageReceived);

                if one_shot {
                    debug!("[{}] One-shot socket message received, disconnecting", label);
                    record.state.manual_disconnect = true;
                    record.teardown();
                    record.state.connected = false;
                    record.state.phase = Phase::Idle;
                    emitted.push(EventKind::Disconnected);
                    return Directive::Stop;
                }
                Directive::Continue(Duration::ZERO)
            }

            TransportEventKind::SocketError(reason) => {
                debug!("[{}] Socket failure: {}", label, reason);
                emitted.push(EventKind::Error);
                Directive::Continue(Duration::ZERO)
            }

            TransportEventKind::SocketDown => {
                if let Some(transport) = record.transport.as_mut() {
                    transport.ready = false;
                }
                Directive::Continue(Duration::ZERO)
            }

            TransportEventKind::SocketClosed(unsent) => {
                if let Some(transport) = record.transport.as_mut() {
                    transport.ready = false;
                }
                if !unsent.is_empty() {
                    debug!("[{}] Re-buffering {} undelivered messages", label, unsent.len());
                    record.state.messages_sent =
                        record.state.messages_sent.saturating_sub(unsent.len() as u64);
                    record.outbox.requeue_front(unsent);
                }
                if record.state.mark_disconnected() {
                    info!("[{}] Socket disconnected", label);
                    emitted.push(EventKind::Disconnected);
                }
                self.retry_or_halt(label, record, transport_kind, one_shot, error_mode)
            }
        }
    }

    fn retry_or_halt(
        &self,
        label: &str,
        record: &mut LabelRecord,
        transport_kind: TransportKind,
        one_shot: bool,
        error_mode: ErrorMode,
    ) -> Directive {
        let delay = match transport_kind {
            TransportKind::Poll => self.config.error_backoff(),
            TransportKind::Socket => self.config.reconnect_delay(),
        };
        let strategy = strategy_for(error_mode, one_shot, record.state.manual_disconnect, delay);

        match strategy.next_delay(record.state.failed_attempts) {
            Some(delay) => {
                record.state.failed_attempts += 1;
                record.state.reconnect_count += 1;
                record.state.phase = Phase::Reconnecting;
                debug!(
                    "[{}] Retrying in {:?} (attempt {})",
                    label, delay, record.state.failed_attempts
                );
                Directive::Continue(delay)
            }
            None => {
                warn!("[{}] Transport halted ({}, one-shot: {})", label, error_mode, one_shot);
                record.teardown();
                record.state.phase = Phase::Idle;
                Directive::Stop
            }
        }
    }
}
