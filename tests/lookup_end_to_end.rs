//! End-to-end lookups: TOML config → provider race → rendered output.

use std::time::Duration;

use cepfast::{AppConfig, OutputFormat, presenter};
use cepfast_race::RaceResult;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn provider_server(body: serde_json::Value, delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/01153000/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(&server)
        .await;
    server
}

fn write_config(dir: &tempfile::TempDir, toml: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml).expect("write config");
    path
}

#[tokio::test]
async fn config_file_providers_race_and_render() {
    let slow = provider_server(
        json!({"cep": "01153-000", "localidade": "Slow"}),
        Duration::from_secs(2),
    )
    .await;
    let fast = provider_server(
        json!({"cep": "01153-000", "localidade": "São Paulo"}),
        Duration::from_millis(30),
    )
    .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        &dir,
        &format!(
            r#"
[race]
timeout_ms = 1000

[[race.providers]]
name = "Slow"
url_template = "{}/ws/{{query}}/json/"

[[race.providers]]
name = "Fast"
url_template = "{}/ws/{{query}}/json/"
"#,
            slow.uri(),
            fast.uri()
        ),
    );

    let config = AppConfig::load(Some(&path)).expect("load config");
    let result = cepfast::lookup("01153000", &config).await.expect("lookup");

    let text = presenter::render(&result, OutputFormat::Text).expect("render");
    let mut lines = text.lines();
    let header = lines.next().expect("header line");
    assert!(header.starts_with("Fastest response from: Fast"), "{header}");
    assert_eq!(lines.next(), Some("cep: 01153-000"));
    assert_eq!(lines.next(), Some("localidade: São Paulo"));
}

#[tokio::test]
async fn timeout_renders_single_message() {
    let a = provider_server(json!({"cep": "01153-000"}), Duration::from_secs(5)).await;
    let b = provider_server(json!({"cep": "01153-000"}), Duration::from_secs(5)).await;

    let mut config = AppConfig::default();
    config.race.timeout_ms = 300;
    config.race.providers = vec![
        cepfast_race::ProviderConfig::new("A", format!("{}/ws/{{query}}/json/", a.uri())),
        cepfast_race::ProviderConfig::new("B", format!("{}/ws/{{query}}/json/", b.uri())),
    ];

    let result = cepfast::lookup("01153000", &config).await.expect("lookup");
    assert!(result.is_timeout());
    assert_eq!(
        presenter::render(&result, OutputFormat::Text).expect("render"),
        "Timeout: no provider responded within 300 ms"
    );
}

#[tokio::test]
async fn all_failed_renders_json_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut config = AppConfig::default();
    config.race.providers = vec![cepfast_race::ProviderConfig::new(
        "Gateway",
        format!("{}/ws/{{query}}/json/", server.uri()),
    )];

    let result = cepfast::lookup("01153000", &config).await.expect("lookup");
    assert!(matches!(result, RaceResult::AllFailed { .. }));

    let rendered = presenter::render(&result, OutputFormat::Json).expect("render");
    let doc: serde_json::Value = serde_json::from_str(&rendered).expect("json");
    assert_eq!(doc["status"], "all_failed");
    assert_eq!(doc["failures"][0]["source"], "Gateway");
    assert_eq!(doc["failures"][0]["kind"], "status");
}
