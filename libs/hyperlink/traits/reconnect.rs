use crate::mode::ErrorMode;
use std::time::Duration;

/// Retry policy consulted after every failed poll or closed socket
///
/// `attempt` counts consecutive failures since the label last connected,
/// starting at 0. Returning `None` halts the transport; the label then
/// stays idle until the caller restarts it.
pub trait ReconnectionStrategy: Send + Sync {
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.next_delay(attempt).is_some()
    }
}

/// Same wait before every retry, optionally capped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }

    /// Retry forever; the `AutoReconnect` policy
    pub fn unlimited(delay: Duration) -> Self {
        Self::new(delay, None)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.delay),
        }
    }
}

/// Halt on the first failure
///
/// Applies under `HatOnly`, to one-shot transports, and after a manual
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }
}

/// Pick the strategy for a label's next reconnection decision
///
/// `delay` is the transport family's wait: the error backoff for polling,
/// the reconnect delay for sockets.
pub fn strategy_for(
    error_mode: ErrorMode,
    one_shot: bool,
    manual_disconnect: bool,
    delay: Duration,
) -> Box<dyn ReconnectionStrategy> {
    if one_shot || manual_disconnect || error_mode == ErrorMode::HatOnly {
        Box::new(NeverReconnect)
    } else {
        Box::new(FixedDelay::unlimited(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(3);

    #[test]
    fn test_fixed_delay_cap() {
        let capped = FixedDelay::new(DELAY, Some(2));
        assert_eq!(capped.next_delay(0), Some(DELAY));
        assert_eq!(capped.next_delay(1), Some(DELAY));
        assert_eq!(capped.next_delay(2), None);
        assert!(!capped.should_reconnect(5));

        let unlimited = FixedDelay::unlimited(DELAY);
        assert_eq!(unlimited.next_delay(10_000), Some(DELAY));
    }

    #[test]
    fn test_strategy_selection() {
        let auto = strategy_for(ErrorMode::AutoReconnect, false, false, DELAY);
        assert_eq!(auto.next_delay(7), Some(DELAY));

        assert!(!strategy_for(ErrorMode::HatOnly, false, false, DELAY).should_reconnect(0));
        assert!(!strategy_for(ErrorMode::AutoReconnect, true, false, DELAY).should_reconnect(0));
        assert!(!strategy_for(ErrorMode::AutoReconnect, false, true, DELAY).should_reconnect(0));
    }
}
