//! Shared HTTP client for provider requests.
//!
//! One [`reqwest::Client`] is built per coordinator and cloned into every
//! fetcher, so all providers share a connection pool.

use crate::config::RaceConfig;
use crate::error::RaceError;

/// Default User-Agent sent to providers.
pub const DEFAULT_USER_AGENT: &str = concat!("cepfast/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for provider lookups.
///
/// The client has:
/// - Connect timeout from config
/// - Overall request timeout equal to the race deadline (a backstop; each
///   fetch also observes the shared deadline directly)
/// - User-Agent from config, or [`DEFAULT_USER_AGENT`]
/// - At most 10 redirects
///
/// # Errors
///
/// Returns [`RaceError::Config`] if the client cannot be constructed.
pub fn build_client(config: &RaceConfig) -> Result<reqwest::Client, RaceError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.timeout())
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| RaceError::Config(format!("failed to build HTTP client: {e}")))
}
