//! Polling transport
//!
//! Repeatedly fetches the endpoint and reports each outcome to the
//! supervisor, which decides whether and when the next cycle runs:
//!
//! 1. Build the URL with a fresh cache-busting `_t` token
//! 2. Fetch through the configured [`PollSource`]
//! 3. Report success or failure and wait for a [`Directive`]
//! 4. Sleep for the returned delay, or exit on `Stop`

use crate::error::{HyperLinkError, Result};
use crate::poll_source::PollSource;
use crate::transport::{Directive, TransportContext, TransportEventKind};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Name of the query parameter that defeats intermediate caches
const CACHE_BUST_PARAM: &str = "_t";

/// Source of strictly increasing cache-busting tokens
///
/// Tokens track wall-clock milliseconds but never repeat, even when two
/// requests are issued within the same millisecond.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicU64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Append the cache-busting parameter to `url`, keeping any fragment last
pub fn cache_busted_url(url: &str, token: u64) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    match fragment {
        Some(fragment) => format!("{}{}{}={}#{}", base, separator, CACHE_BUST_PARAM, token, fragment),
        None => format!("{}{}{}={}", base, separator, CACHE_BUST_PARAM, token),
    }
}

/// HTTP implementation of [`PollSource`] backed by reqwest
pub struct HttpPollSource {
    client: Client,
}

impl HttpPollSource {
    /// Create a client with the given per-request timeout
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(15))
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PollSource for HttpPollSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HyperLinkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Polling transport task body
pub(crate) async fn run_poll_transport(
    ctx: TransportContext,
    source: Arc<dyn PollSource>,
    tokens: Arc<CacheBuster>,
    url: String,
    mut shutdown: oneshot::Receiver<()>,
) {
    debug!("[{}] Poll transport started (epoch {})", ctx.label(), ctx.epoch());

    loop {
        ctx.notify(TransportEventKind::Attempt);
        let target = cache_busted_url(&url, tokens.next_token());

        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = source.fetch(&target) => result,
        };

        let kind = match outcome {
            Ok(body) => TransportEventKind::PollSucceeded(body),
            Err(e) => {
                warn!("[{}] Poll failed: {}", ctx.label(), e);
                TransportEventKind::PollFailed(e.to_string())
            }
        };

        let delay = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            directive = ctx.decide(kind) => match directive {
                Directive::Continue(delay) => delay,
                Directive::Stop => break,
            },
        };

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!("[{}] Poll transport exiting (epoch {})", ctx.label(), ctx.epoch());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_busted_url_separator() {
        assert_eq!(cache_busted_url("https://a.example/data", 5), "https://a.example/data?_t=5");
        assert_eq!(cache_busted_url("https://a.example/data?x=1", 5), "https://a.example/data?x=1&_t=5");
        assert_eq!(cache_busted_url("https://a.example/p#top", 9), "https://a.example/p?_t=9#top");
    }

    #[test]
    fn test_tokens_strictly_increase() {
        let tokens = CacheBuster::new();
        let mut previous = tokens.next_token();
        for _ in 0..1000 {
            let next = tokens.next_token();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_http_source_builds() {
        assert!(HttpPollSource::new(Duration::from_secs(5)).is_ok());
    }
}
