//! # cepfast-race
//!
//! Resolve a postal-code lookup by racing independent address providers.
//!
//! Every configured provider is queried concurrently; the first one to
//! answer with a parsed JSON object wins. The race is bounded by a single
//! deadline shared by all fetches.
//!
//! ## Design
//!
//! - One spawned task per provider, each sending exactly one [`Outcome`]
//!   into a bounded channel created per race
//! - A provider failure only removes that provider from the race; the race
//!   ends on the first success, when every provider has failed, or at the
//!   deadline
//! - Settling cancels the shared [`Deadline`], so abandoned requests are
//!   dropped instead of running on
//! - No retries, no merging of multiple successes

pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod provider;
pub mod race;
pub mod types;

pub use config::{RaceConfig, SettlePolicy};
pub use error::{FetchError, FetchErrorKind, RaceError, Result};
pub use fetch::{AddressFetcher, Deadline, HttpFetcher};
pub use provider::ProviderConfig;
pub use race::{race, race_with_policy, RaceCoordinator};
pub use types::{FieldValue, Fields, Outcome, ProviderFailure, Query, RaceResult, Winner};

/// Look up `query` across every provider in `config`.
///
/// Convenience wrapper that builds a [`RaceCoordinator`], runs one race with
/// `config.timeout_ms` as the deadline and maps the non-success results to
/// errors.
///
/// # Errors
///
/// - [`RaceError::Config`] if `config` is invalid
/// - [`RaceError::Timeout`] if no provider answered before the deadline
/// - [`RaceError::AllProvidersFailed`] if every provider failed
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> cepfast_race::Result<()> {
/// let config = cepfast_race::RaceConfig::default();
/// let winner = cepfast_race::lookup("01153000", &config).await?;
/// println!("fastest: {}", winner.source);
/// for (key, value) in &winner.fields {
///     println!("{key}: {value}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn lookup(query: &str, config: &RaceConfig) -> Result<Winner> {
    let coordinator = RaceCoordinator::from_config(config)?;
    coordinator
        .race(&Query::new(query), config.timeout())
        .await
        .into_result()
}

/// Look up `query` with [`RaceConfig::default()`].
///
/// # Errors
///
/// Same as [`lookup`].
pub async fn lookup_default(query: &str) -> Result<Winner> {
    lookup(query, &RaceConfig::default()).await
}
