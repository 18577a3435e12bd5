//! Error kinds surfaced by the acquisition core.

use thiserror::Error;

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// Malformed ZIP code, or a URL rejected by the [`UrlPolicy`](crate::UrlPolicy).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure, non-200 status, or a body that does not decode.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("no observation stations found")]
    NoStationsFound,
}

impl WeatherError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }
}
