//! cepfast: fastest-wins postal code lookup.
//!
//! Races every configured address provider for a CEP and prints whichever
//! answers first. The race itself lives in the `cepfast-race` crate; this
//! crate adds the TOML configuration layer, result rendering and the CLI.

pub mod config;
pub mod error;
pub mod presenter;

pub use config::{AppConfig, OutputFormat};
pub use error::{AppError, Result};

use cepfast_race::{Query, RaceCoordinator, RaceResult};

/// CEP looked up when none is given on the command line.
pub const DEFAULT_QUERY: &str = "01153000";

/// Run one lookup race for `query` with the providers and deadline in `config`.
///
/// Timeouts and provider failures are returned as [`RaceResult`] variants,
/// not errors, so the caller can render them.
///
/// # Errors
///
/// Returns [`AppError::Config`] for a blank query and
/// [`AppError::Lookup`] if the race configuration is invalid.
pub async fn lookup(query: &str, config: &AppConfig) -> Result<RaceResult> {
    let query = Query::new(query);
    if query.is_blank() {
        return Err(AppError::Config("query must not be empty".into()));
    }

    let coordinator = RaceCoordinator::from_config(&config.race)?;
    tracing::info!(
        providers = ?coordinator.provider_names(),
        timeout_ms = config.race.timeout_ms,
        "racing providers"
    );

    let result = coordinator.race(&query, config.race.timeout()).await;
    match &result {
        RaceResult::Success(winner) => {
            tracing::info!(provider = %winner.source, elapsed = ?winner.elapsed, "lookup resolved");
        }
        RaceResult::Timeout { .. } => tracing::warn!("lookup timed out"),
        RaceResult::AllFailed { failures } => {
            tracing::warn!(failed = failures.len(), "every provider failed");
        }
    }
    Ok(result)
}
