//! Race configuration with sensible defaults.
//!
//! [`RaceConfig`] controls which providers are raced, the overall deadline,
//! and how the race settles. The defaults race BrasilAPI against ViaCEP with
//! a one second deadline.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RaceError;
use crate::provider::ProviderConfig;

/// Rule deciding which outcome ends a race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlePolicy {
    /// Wait for the first success, for every provider to fail, or for the
    /// deadline, whichever comes first. A single provider failure never
    /// ends the race.
    #[default]
    FirstSuccess,
    /// The first outcome of any kind ends the race. A failure arriving first
    /// settles as all-failed even if another provider would still answer.
    FirstOutcome,
}

/// Configuration for a lookup race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Overall race deadline in milliseconds.
    pub timeout_ms: u64,
    /// TCP/TLS connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    pub settle_policy: SettlePolicy,
    /// Custom User-Agent. Defaults to `cepfast/<version>`.
    pub user_agent: Option<String>,
    /// Providers raced concurrently, one fetch each.
    pub providers: Vec<ProviderConfig>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1_000,
            connect_timeout_ms: 1_000,
            settle_policy: SettlePolicy::FirstSuccess,
            user_agent: None,
            providers: ProviderConfig::defaults(),
        }
    }
}

impl RaceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_ms` and `connect_timeout_ms` must be greater than 0
    /// - `providers` must not be empty, names must be unique
    /// - every provider must pass [`ProviderConfig::validate`]
    pub fn validate(&self) -> Result<(), RaceError> {
        if self.timeout_ms == 0 {
            return Err(RaceError::Config(
                "timeout_ms must be greater than 0".into(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(RaceError::Config(
                "connect_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(RaceError::Config(
                "at least one provider must be configured".into(),
            ));
        }
        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.name.as_str()) {
                return Err(RaceError::Config(format!(
                    "duplicate provider name '{}'",
                    provider.name
                )));
            }
        }
        Ok(())
    }
}
