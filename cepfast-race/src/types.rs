//! Core types: queries, parsed address payloads, per-provider outcomes and race results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FetchError, RaceError};

/// An opaque lookup token (e.g. a CEP) passed unmodified to every provider.
///
/// Cloning is cheap; the text is shared between all fetch tasks of a race.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(Arc<str>);

impl Query {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self(Arc::from(token.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the token is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Object-shaped payload returned by a provider, in response order.
pub type Fields = IndexMap<String, FieldValue>;

/// A loosely typed JSON value, restricted to what address payloads contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<FieldValue>),
    Object(Fields),
}

impl FieldValue {
    /// Returns the string content if this is a [`FieldValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    /// Scalars print bare (strings without quotes); lists and objects print
    /// as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(_) | Self::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// A successful provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    /// Name of the provider that answered.
    pub source: String,
    /// Parsed response body.
    pub fields: Fields,
    /// How long the fetch took.
    pub elapsed: Duration,
}

/// A failed provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub source: String,
    pub error: FetchError,
    pub elapsed: Duration,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// The terminal result of one provider fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Winner),
    Failure(ProviderFailure),
}

impl Outcome {
    /// Name of the provider that produced this outcome.
    pub fn source(&self) -> &str {
        match self {
            Self::Success(w) => &w.source,
            Self::Failure(f) => &f.source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// The single result of a race.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceResult {
    /// A provider answered with a parsed payload before the deadline.
    Success(Winner),
    /// The deadline elapsed first. Carries the failures seen before it did.
    Timeout {
        timeout: Duration,
        failures: Vec<ProviderFailure>,
    },
    /// Every provider failed before the deadline.
    AllFailed { failures: Vec<ProviderFailure> },
}

impl RaceResult {
    pub fn winner(&self) -> Option<&Winner> {
        match self {
            Self::Success(w) => Some(w),
            _ => None,
        }
    }

    /// Failures observed before the race settled. Empty on success.
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::Success(_) => &[],
            Self::Timeout { failures, .. } | Self::AllFailed { failures } => failures,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Convert into a `Result`, mapping the two failure states to [`RaceError`].
    pub fn into_result(self) -> Result<Winner, RaceError> {
        match self {
            Self::Success(w) => Ok(w),
            Self::Timeout { timeout, .. } => Err(RaceError::Timeout(format!(
                "no provider responded within {} ms",
                timeout.as_millis()
            ))),
            Self::AllFailed { failures } => Err(RaceError::AllProvidersFailed(join_failures(
                &failures,
            ))),
        }
    }
}

/// Join failures as `name: error; name: error`.
pub fn join_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no provider reported".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
