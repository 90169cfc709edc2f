//! Provider fetcher: one GET, one outcome.
//!
//! [`AddressFetcher`] is the single capability the race coordinator needs
//! from a provider. [`HttpFetcher`] is the production implementation; it
//! resolves the provider URL, issues one request bounded by the shared
//! [`Deadline`], reads the whole body and parses it as a JSON object.
//!
//! Every failure path produces a [`Outcome::Failure`]. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::provider::ProviderConfig;
use crate::types::{Fields, Outcome, ProviderFailure, Query, Winner};

/// The deadline shared by every fetch in one race.
///
/// Fires when the instant passes or the token is cancelled, whichever
/// happens first. The coordinator cancels the token once it settles so
/// abandoned fetches stop early.
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    token: CancellationToken,
}

impl Deadline {
    /// A deadline `timeout` from now with a fresh token.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            token: CancellationToken::new(),
        }
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fire the deadline early.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.at
    }

    /// Time left before the instant passes. Zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Completes when the deadline fires.
    pub async fn expired(&self) {
        tokio::select! {
            () = self.token.cancelled() => {}
            () = tokio::time::sleep_until(self.at) => {}
        }
    }
}

/// Something that can look up a query and report exactly one [`Outcome`].
///
/// Implementations must observe `deadline` and return promptly with a
/// [`FetchError::Cancelled`] failure once it fires.
#[async_trait]
pub trait AddressFetcher: Send + Sync {
    /// Provider name reported as the outcome source.
    fn name(&self) -> &str;

    /// Perform one lookup. Never retries, never panics on provider errors.
    async fn fetch(&self, query: &Query, deadline: &Deadline) -> Outcome;
}

/// [`AddressFetcher`] backed by an HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    provider: ProviderConfig,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(provider: ProviderConfig, client: reqwest::Client) -> Self {
        Self { provider, client }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }
}

#[async_trait]
impl AddressFetcher for HttpFetcher {
    fn name(&self) -> &str {
        &self.provider.name
    }

    async fn fetch(&self, query: &Query, deadline: &Deadline) -> Outcome {
        fetch(&self.client, &self.provider, query, deadline).await
    }
}

/// Fetch `query` from `provider`, bounded by `deadline`.
///
/// An already-expired deadline short-circuits before any I/O. While the
/// request is in flight the deadline is checked first on every wake-up, so
/// a fired deadline always reports [`FetchError::Cancelled`] and drops the
/// request, releasing its connection.
pub async fn fetch(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    query: &Query,
    deadline: &Deadline,
) -> Outcome {
    let started = Instant::now();
    tracing::trace!(provider = %provider.name, %query, "provider fetch");

    let result = if deadline.is_expired() {
        Err(FetchError::Cancelled)
    } else {
        tokio::select! {
            biased;
            () = deadline.expired() => Err(FetchError::Cancelled),
            result = request(client, provider, query, deadline) => result,
        }
    };

    let elapsed = started.elapsed();
    let source = provider.name.clone();
    match result {
        Ok(fields) => {
            tracing::debug!(
                provider = %source,
                fields = fields.len(),
                ?elapsed,
                "provider answered"
            );
            Outcome::Success(Winner {
                source,
                fields,
                elapsed,
            })
        }
        Err(error) => {
            tracing::debug!(provider = %source, error = %error, ?elapsed, "provider fetch failed");
            Outcome::Failure(ProviderFailure {
                source,
                error,
                elapsed,
            })
        }
    }
}

async fn request(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    query: &Query,
    deadline: &Deadline,
) -> Result<Fields, FetchError> {
    let url = provider.resolve_url(query)?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_send(e, deadline.is_expired()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::from_body(e, deadline.is_expired()))?;
    tracing::trace!(provider = %provider.name, bytes = body.len(), "response received");

    parse_fields(&body)
}

/// Parse a response body as a JSON object.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] for invalid JSON or a non-object top level.
pub fn parse_fields(body: &[u8]) -> Result<Fields, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RaceConfig;
    use crate::http::build_client;
    use crate::types::FieldValue;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn failure(outcome: Outcome) -> ProviderFailure {
        match outcome {
            Outcome::Failure(f) => f,
            Outcome::Success(w) => panic!("expected failure, got success from {}", w.source),
        }
    }

    #[test]
    fn parse_fields_accepts_object() {
        let fields = parse_fields(r#"{"cep":"01153000","city":"São Paulo"}"#.as_bytes())
            .expect("valid object");
        assert_eq!(fields["city"], FieldValue::Text("São Paulo".into()));
    }

    #[test]
    fn parse_fields_rejects_garbage() {
        let err = parse_fields(b"<html>500 Internal Server Error</html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn parse_fields_rejects_non_object() {
        let err = parse_fields(b"[]").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn parse_fields_rejects_truncated_body() {
        let err = parse_fields(br#"{"cep":"0115"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn http_fetcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpFetcher>();
    }

    #[tokio::test]
    async fn deadline_fires_after_timeout() {
        let deadline = Deadline::after(Duration::from_millis(20));
        assert!(!deadline.is_expired());
        let fired = tokio::time::timeout(Duration::from_secs(2), deadline.expired()).await;
        assert!(fired.is_ok());
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn deadline_fires_on_cancel() {
        let deadline = Deadline::after(Duration::from_secs(60));
        let clone = deadline.clone();
        clone.cancel();
        assert!(deadline.is_expired());
        let fired = tokio::time::timeout(Duration::from_millis(100), deadline.expired()).await;
        assert!(fired.is_ok());
    }

    #[tokio::test]
    async fn expired_deadline_skips_network() {
        let deadline = Deadline::after(Duration::from_secs(60));
        deadline.cancel();
        // Port 9 (discard) on a reserved TEST-NET address: never contacted.
        let provider = ProviderConfig::new("Unreachable", "http://192.0.2.1:9/{query}");
        let outcome = fetch(
            &reqwest::Client::new(),
            &provider,
            &Query::new("01153000"),
            &deadline,
        )
        .await;
        match outcome {
            Outcome::Failure(f) => {
                assert_eq!(f.source, "Unreachable");
                assert_eq!(f.error, FetchError::Cancelled);
            }
            Outcome::Success(_) => panic!("expected cancellation"),
        }
    }

    #[tokio::test]
    async fn malformed_template_reports_request_construction() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let provider = ProviderConfig::new("Broken", "::not-a-url::/{query}");
        let outcome = fetch(
            &reqwest::Client::new(),
            &provider,
            &Query::new("01153000"),
            &deadline,
        )
        .await;
        match outcome {
            Outcome::Failure(f) => {
                assert!(matches!(f.error, FetchError::RequestConstruction(_)))
            }
            Outcome::Success(_) => panic!("expected request construction failure"),
        }
    }

    #[tokio::test]
    async fn in_flight_fetch_is_cancelled_when_deadline_fires() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"cep":"01153000"}"#)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let provider = ProviderConfig::new("Slow", format!("{}/cep/{{query}}", server.uri()));
        let deadline = Deadline::after(Duration::from_millis(100));
        let started = Instant::now();
        let outcome = fetch(
            &reqwest::Client::new(),
            &provider,
            &Query::new("01153000"),
            &deadline,
        )
        .await;

        let f = failure(outcome);
        assert_eq!(f.error, FetchError::Cancelled);
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "fetch outlived its deadline: {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn connect_timeout_is_transport_not_cancelled() {
        let config = RaceConfig {
            timeout_ms: 3_000,
            connect_timeout_ms: 200,
            ..Default::default()
        };
        let client = build_client(&config).expect("client");
        // TEST-NET-1 is never routed: the connect either times out or fails outright.
        let provider = ProviderConfig::new("Blackhole", "http://192.0.2.1:81/{query}");
        let deadline = Deadline::after(config.timeout());
        let started = Instant::now();
        let outcome = fetch(&client, &provider, &Query::new("01153000"), &deadline).await;

        let f = failure(outcome);
        assert!(
            matches!(f.error, FetchError::Transport(_)),
            "expected transport failure, got {:?}",
            f.error
        );
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!deadline.is_expired());
    }
}
