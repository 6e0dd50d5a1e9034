use crate::config::SupervisorConfig;
use crate::error::{HyperLinkError, Result};
use crate::events::EventEdgeQueue;
use crate::notifier::{HostNotifier, NoopNotifier};
use crate::poll::HttpPollSource;
use crate::poll_source::PollSource;
use crate::supervisor::ConnectionSupervisor;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Builder for [`ConnectionSupervisor`]
///
/// Every part is optional: defaults are [`SupervisorConfig::default`], an
/// HTTP poll source using the configured request timeout, a no-op host
/// notifier, and the runtime the builder is called from.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<SupervisorConfig>,
    poll_source: Option<Arc<dyn PollSource>>,
    notifier: Option<Arc<dyn HostNotifier>>,
    runtime: Option<Handle>,
}

impl SupervisorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: SupervisorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the HTTP client used by polling transports
    pub fn poll_source(mut self, source: Arc<dyn PollSource>) -> Self {
        self.poll_source = Some(source);
        self
    }

    /// Set the host wake-up hook invoked after every queued event
    pub fn notifier(mut self, notifier: Arc<dyn HostNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Spawn transports on `handle` instead of the current runtime
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<ConnectionSupervisor> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| HyperLinkError::Configuration(e.to_string()))?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                HyperLinkError::Configuration(format!("No tokio runtime available: {}", e))
            })?,
        };

        let poll_source = match self.poll_source {
            Some(source) => source,
            None => Arc::new(HttpPollSource::new(config.request_timeout())?),
        };

        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier));
        let events = EventEdgeQueue::new(notifier);

        Ok(ConnectionSupervisor::from_parts(config, poll_source, events, runtime))
    }
}

impl ConnectionSupervisor {
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Supervisor with `config` and all other defaults
    pub fn new(config: SupervisorConfig) -> Result<Self> {
        SupervisorBuilder::new().config(config).build()
    }
}
