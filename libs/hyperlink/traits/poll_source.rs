use crate::error::Result;
use async_trait::async_trait;

/// Trait for the request half of the polling transport
///
/// The polling loop builds the cache-busting URL and interprets the
/// result; implementations only perform one read against it.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// Fetch the body at `url`
    ///
    /// # Returns
    /// * `Ok(body)` - Successful response, body as text
    /// * `Err(HyperLinkError)` - Network failure or non-success status
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptedPollSource, ScriptedResponse};

/// Network-free poll source for tests, behind the `test-util` feature
#[cfg(any(test, feature = "test-util"))]
mod scripted {
    use super::PollSource;
    use crate::error::{HyperLinkError, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// One scripted poll outcome
    #[derive(Debug, Clone)]
    pub enum ScriptedResponse {
        Body(String),
        Failure(String),
    }

    impl ScriptedResponse {
        pub fn body(text: impl Into<String>) -> Self {
            ScriptedResponse::Body(text.into())
        }

        pub fn failure(reason: impl Into<String>) -> Self {
            ScriptedResponse::Failure(reason.into())
        }
    }

    /// A poll source that replays a fixed script
    ///
    /// Useful for testing hosts without a network: each fetch pops the next
    /// response. Once the script is exhausted, fetches never complete.
    pub struct ScriptedPollSource {
        script: Mutex<VecDeque<ScriptedResponse>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedPollSource {
        pub fn new(script: impl IntoIterator<Item = ScriptedResponse>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Append more responses to the end of the script
        pub fn push(&self, response: ScriptedResponse) {
            self.script.lock().push_back(response);
        }

        /// URLs requested so far, in order
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }

        /// Number of responses not yet consumed
        pub fn remaining(&self) -> usize {
            self.script.lock().len()
        }
    }

    #[async_trait]
    impl PollSource for ScriptedPollSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().push(url.to_string());

            let next = self.script.lock().pop_front();
            match next {
                Some(ScriptedResponse::Body(text)) => Ok(text),
                Some(ScriptedResponse::Failure(reason)) => Err(HyperLinkError::Other(reason)),
                None => std::future::pending().await,
            }
        }
    }
}
