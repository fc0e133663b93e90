use std::time::Duration;

use thiserror::Error;

/// Errors raised by indicator data providers.
///
/// Only [`ProviderError::Unavailable`] is meaningful to callers of the
/// [`FallbackChain`](super::FallbackChain); every other variant describes a
/// live-source failure that is absorbed by falling back to the static dataset.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No data for city '{0}'")]
    Unavailable(String),

    #[error("Category '{0}' is not offered by this provider")]
    Unsupported(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Classify a `reqwest` failure of a client configured with `timeout`
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout)
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Upstream(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
