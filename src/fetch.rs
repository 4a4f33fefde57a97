//! HTTP access for the build-time fetch jobs.
//!
//! The [`Fetcher`] trait is the only way the avatar and changelog jobs reach
//! the network, so the rest of the codebase can be exercised against a
//! recorded mock. The production implementation is [`HttpFetcher`], a thin
//! wrapper over a blocking [`ureq`] agent.
//!
//! Requests are made once. There is no retry, backoff, or caching: a failed
//! request surfaces as a [`FetchError`] and the calling job decides whether
//! to skip the item or abort.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {code}")]
    Status { url: String, code: u16 },
    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Blocking GET access to remote resources.
pub trait Fetcher: Sync {
    /// Fetch a UTF-8 text body.
    fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch a binary body, fully buffered.
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetcher`] backed by `ureq`.
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            user_agent: user_agent.into(),
        }
    }

    fn get(&self, url: &str) -> Result<ureq::http::Response<ureq::Body>, FetchError> {
        tracing::debug!(url, "GET");
        self.agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|err| map_error(url, err))
    }
}

impl Fetcher for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self.get(url)?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|err| map_error(url, err))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self.get(url)?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|err| map_error(url, err))
    }
}

fn map_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(code) => FetchError::Status {
            url: url.to_string(),
            code,
        },
        other => FetchError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
