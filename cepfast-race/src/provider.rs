//! Address provider descriptors.
//!
//! A provider is a name plus a URL template with exactly one `{query}`
//! placeholder. The query is substituted verbatim; no other transformation
//! happens before the result is parsed as a URL.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FetchError, RaceError};
use crate::types::Query;

/// Placeholder replaced by the query token in a URL template.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// A named HTTP endpoint that answers address lookups with a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name, reported as the source of a winning result.
    pub name: String,
    /// Endpoint template, e.g. `https://brasilapi.com.br/api/cep/v1/{query}`.
    pub url_template: String,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
        }
    }

    /// BrasilAPI CEP v1 endpoint.
    pub fn brasil_api() -> Self {
        Self::new("BrasilAPI", "https://brasilapi.com.br/api/cep/v1/{query}")
    }

    /// ViaCEP JSON endpoint.
    pub fn via_cep() -> Self {
        Self::new("ViaCEP", "http://viacep.com.br/ws/{query}/json/")
    }

    /// The providers raced when none are configured.
    pub fn defaults() -> Vec<Self> {
        vec![Self::brasil_api(), Self::via_cep()]
    }

    /// Substitute `query` into the template and parse the result.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RequestConstruction`] if the resulting string is
    /// not an absolute `http`/`https` URL.
    pub fn resolve_url(&self, query: &Query) -> Result<Url, FetchError> {
        let raw = self.url_template.replace(QUERY_PLACEHOLDER, query.as_str());
        let url = Url::parse(&raw)
            .map_err(|e| FetchError::RequestConstruction(format!("{}: {e}", self.name)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FetchError::RequestConstruction(format!(
                "{}: unsupported scheme '{other}'",
                self.name
            ))),
        }
    }

    /// Checks the descriptor is usable.
    ///
    /// The name must be non-blank and the template must contain the
    /// placeholder exactly once.
    pub fn validate(&self) -> Result<(), RaceError> {
        if self.name.trim().is_empty() {
            return Err(RaceError::Config("provider name must not be empty".into()));
        }
        match self.url_template.matches(QUERY_PLACEHOLDER).count() {
            1 => Ok(()),
            0 => Err(RaceError::Config(format!(
                "provider '{}' url_template has no {QUERY_PLACEHOLDER} placeholder",
                self.name
            ))),
            n => Err(RaceError::Config(format!(
                "provider '{}' url_template has {n} {QUERY_PLACEHOLDER} placeholders, expected 1",
                self.name
            ))),
        }
    }
}
