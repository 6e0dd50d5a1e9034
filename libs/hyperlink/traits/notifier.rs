use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Trait for asking the host to re-sample connection state
///
/// Hosts that poll every tick do not need this. Hosts that sleep between
/// redraws implement it to be woken as soon as an event has been queued.
/// The notification carries no payload; the host reads through the
/// supervisor's `poll_*` and `latest` operations.
pub trait HostNotifier: Send + Sync + 'static {
    /// Request that the host re-samples as soon as convenient
    fn request_resample(&self);
}

/// A notifier that does nothing
pub struct NoopNotifier;

impl HostNotifier for NoopNotifier {
    fn request_resample(&self) {}
}

/// Notifier backed by a capacity-one crossbeam channel
///
/// Repeated wake-ups before the host drains the receiver collapse into a
/// single pending notification.
pub struct ChannelNotifier {
    tx: Sender<()>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the host waits on
    pub fn new() -> (Self, Receiver<()>) {
        let (tx, rx) = bounded(1);
        (Self { tx }, rx)
    }
}

impl HostNotifier for ChannelNotifier {
    fn request_resample(&self) {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                tracing::trace!("Host receiver dropped, resample request ignored");
            }
        }
    }
}

/// Notifier wrapping a closure
pub struct FnNotifier<F>(pub F);

impl<F> HostNotifier for FnNotifier<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn request_resample(&self) {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_channel_notifier_collapses_wakeups() {
        let (notifier, rx) = ChannelNotifier::new();

        notifier.request_resample();
        notifier.request_resample();
        notifier.request_resample();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_dropped_host() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.request_resample();
    }

    #[test]
    fn test_fn_notifier_invokes_closure() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let notifier = FnNotifier(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        notifier.request_resample();
        notifier.request_resample();

        assert_eq!(count.load(Ordering::Relaxed), 2);
    }
}
