//! Race coordinator: concurrent fan-out, first success wins.
//!
//! One task is spawned per provider. Each task sends its single
//! [`Outcome`] into a bounded channel created for this race, sized so that
//! no sender can ever block. The coordinator is the only receiver and waits
//! for the first of: a success, every provider failing, or the deadline.
//!
//! # State Machine
//!
//! ```text
//!                 first Success
//!            ┌───────────────────────► Settled-Success
//! ┌─────────┐│  deadline fires
//! │ Pending ├┼───────────────────────► Settled-Timeout
//! └─────────┘│  every provider failed
//!            └───────────────────────► Settled-Exhausted
//! ```
//!
//! Settling cancels the shared [`Deadline`] so outstanding fetches abort;
//! their late outcomes go into the buffered channel and are dropped with it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{RaceConfig, SettlePolicy};
use crate::error::RaceError;
use crate::fetch::{AddressFetcher, Deadline, HttpFetcher};
use crate::http;
use crate::types::{Outcome, ProviderFailure, Query, RaceResult};

/// Races a fixed set of fetchers against each other.
#[derive(Clone)]
pub struct RaceCoordinator {
    fetchers: Vec<Arc<dyn AddressFetcher>>,
    policy: SettlePolicy,
}

impl std::fmt::Debug for RaceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceCoordinator")
            .field("providers", &self.provider_names())
            .field("policy", &self.policy)
            .finish()
    }
}

impl RaceCoordinator {
    /// Create a coordinator over `fetchers` with [`SettlePolicy::FirstSuccess`].
    pub fn new(fetchers: Vec<Arc<dyn AddressFetcher>>) -> Self {
        Self {
            fetchers,
            policy: SettlePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SettlePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build HTTP fetchers for every configured provider, sharing one client.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::Config`] if the config is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &RaceConfig) -> Result<Self, RaceError> {
        config.validate()?;
        let client = http::build_client(config)?;
        let fetchers = config
            .providers
            .iter()
            .map(|provider| {
                Arc::new(HttpFetcher::new(provider.clone(), client.clone()))
                    as Arc<dyn AddressFetcher>
            })
            .collect();
        Ok(Self::new(fetchers).with_policy(config.settle_policy))
    }

    pub fn policy(&self) -> SettlePolicy {
        self.policy
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    /// Race every fetcher for `query`, bounded by `timeout`.
    pub async fn race(&self, query: &Query, timeout: Duration) -> RaceResult {
        race_with_policy(query, &self.fetchers, timeout, self.policy).await
    }
}

/// Race `fetchers` for `query` with [`SettlePolicy::FirstSuccess`].
pub async fn race(
    query: &Query,
    fetchers: &[Arc<dyn AddressFetcher>],
    timeout: Duration,
) -> RaceResult {
    race_with_policy(query, fetchers, timeout, SettlePolicy::FirstSuccess).await
}

/// Race `fetchers` for `query`, settling according to `policy`.
///
/// Must be called from within a tokio runtime; fetches run as spawned tasks.
/// With no fetchers the race is immediately exhausted.
pub async fn race_with_policy(
    query: &Query,
    fetchers: &[Arc<dyn AddressFetcher>],
    timeout: Duration,
    policy: SettlePolicy,
) -> RaceResult {
    let total = fetchers.len();
    if total == 0 {
        tracing::warn!("race started with no providers");
        return RaceResult::AllFailed {
            failures: Vec::new(),
        };
    }

    let deadline = Deadline::after(timeout);
    // Cancels the shared deadline however this function exits, including
    // when the caller drops the race future.
    let _settled = deadline.token().clone().drop_guard();

    let (tx, mut rx) = mpsc::channel::<Outcome>(total);
    for fetcher in fetchers {
        let fetcher = Arc::clone(fetcher);
        let tx = tx.clone();
        let query = query.clone();
        let deadline = deadline.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch(&query, &deadline).await;
            // Capacity equals the number of senders, so this only fails once
            // the coordinator has settled and dropped the receiver.
            if tx.try_send(outcome).is_err() {
                tracing::trace!(provider = fetcher.name(), "race settled, outcome discarded");
            }
        });
    }
    drop(tx);

    tracing::debug!(providers = total, ?timeout, ?policy, "race started");

    let expired = deadline.expired();
    tokio::pin!(expired);
    let mut failures: Vec<ProviderFailure> = Vec::with_capacity(total);

    loop {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some(Outcome::Success(winner)) => {
                    tracing::debug!(
                        provider = %winner.source,
                        elapsed = ?winner.elapsed,
                        failed = failures.len(),
                        "race won"
                    );
                    return RaceResult::Success(winner);
                }
                Some(Outcome::Failure(failure)) => {
                    tracing::warn!(
                        provider = %failure.source,
                        error = %failure.error,
                        "provider failed"
                    );
                    failures.push(failure);
                    if policy == SettlePolicy::FirstOutcome || failures.len() == total {
                        return exhausted(failures, &deadline, timeout);
                    }
                }
                None => {
                    // Every sender is gone without reporting: a fetch task panicked.
                    tracing::warn!(
                        reported = failures.len(),
                        providers = total,
                        "fetch tasks ended without reporting"
                    );
                    return exhausted(failures, &deadline, timeout);
                }
            },
            () = &mut expired => {
                tracing::warn!(?timeout, failed = failures.len(), "race deadline reached");
                return RaceResult::Timeout { timeout, failures };
            }
        }
    }
}

/// Settle a race that ran out of providers.
///
/// If the deadline is what made them fail, the race timed out rather than
/// being exhausted by provider errors.
fn exhausted(failures: Vec<ProviderFailure>, deadline: &Deadline, timeout: Duration) -> RaceResult {
    if deadline.is_expired() || failures.iter().any(|f| f.error.is_cancelled()) {
        tracing::warn!(?timeout, failed = failures.len(), "race deadline reached");
        RaceResult::Timeout { timeout, failures }
    } else {
        tracing::warn!(failed = failures.len(), "all providers failed");
        RaceResult::AllFailed { failures }
    }
}
