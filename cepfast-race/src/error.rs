//! Error types for the cepfast-race crate.
//!
//! [`FetchError`] classifies why a single provider fetch failed. It never
//! escapes the fetcher as an `Err`; it travels inside a failure
//! [`Outcome`](crate::types::Outcome) like any other result.
//!
//! [`RaceError`] is the race-level error returned by the convenience
//! wrappers that turn a [`RaceResult`](crate::types::RaceResult) into a
//! `Result`.

use serde::Serialize;

/// Why one provider fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The query and template could not be turned into a valid request.
    #[error("request construction failed: {0}")]
    RequestConstruction(String),

    /// Connection refused, DNS failure, reset, TLS failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The shared race deadline fired while the fetch was in flight.
    #[error("cancelled: race deadline reached")]
    Cancelled,

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response body stream ended abnormally.
    #[error("body read failed: {0}")]
    BodyRead(String),

    /// The body was read fully but is not a JSON object.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Stable, machine-readable classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    RequestConstruction,
    Transport,
    Cancelled,
    Status,
    BodyRead,
    Parse,
}

impl FetchError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::RequestConstruction(_) => FetchErrorKind::RequestConstruction,
            Self::Transport(_) => FetchErrorKind::Transport,
            Self::Cancelled => FetchErrorKind::Cancelled,
            Self::Status(_) => FetchErrorKind::Status,
            Self::BodyRead(_) => FetchErrorKind::BodyRead,
            Self::Parse(_) => FetchErrorKind::Parse,
        }
    }

    /// Whether the failure was caused by the race deadline rather than the provider.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Classify a [`reqwest::Error`] raised while sending a request.
    ///
    /// Builder errors are request-construction problems. A client-side
    /// timeout counts as the deadline firing only when `deadline_fired`;
    /// a connect timeout is always a transport failure of that provider.
    /// The URL (which embeds the query) is stripped from the message.
    pub(crate) fn from_send(err: reqwest::Error, deadline_fired: bool) -> Self {
        if err.is_builder() {
            Self::RequestConstruction(err.without_url().to_string())
        } else if err.is_timeout() && !err.is_connect() && deadline_fired {
            Self::Cancelled
        } else {
            Self::Transport(err.without_url().to_string())
        }
    }

    /// Classify a [`reqwest::Error`] raised while reading the body.
    pub(crate) fn from_body(err: reqwest::Error, deadline_fired: bool) -> Self {
        if err.is_timeout() && deadline_fired {
            Self::Cancelled
        } else {
            Self::BodyRead(err.without_url().to_string())
        }
    }
}

/// Race-level errors.
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    /// The deadline elapsed before any provider succeeded.
    #[error("lookup timed out: {0}")]
    Timeout(String),

    /// Every provider reported a failure.
    #[error("all providers failed: {0}")]
    AllProvidersFailed(String),

    /// Invalid race configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for cepfast-race results.
pub type Result<T> = std::result::Result<T, RaceError>;
