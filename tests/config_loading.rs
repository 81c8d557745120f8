//! Configuration file and environment override tests

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use basarometer_core::infrastructure::config::{AppConfig, CollectorKind};
use basarometer_core::infrastructure::build_collectors;

fn toml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_overrides_defaults() {
    let file = toml_file(
        r#"
        [coordinator]
        stagger_offset_ms = 250
        max_concurrent_collectors = 4

        [validation]
        acceptance_threshold = 0.7

        [[collectors]]
        source_id = "victory"
        kind = "victory"
        request_delay_ms = 0

        [[collectors]]
        source_id = "mega"
        kind = "mega"
        enabled = false
        "#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    let settings = config.coordinator_settings();

    assert_eq!(settings.stagger_offset, Duration::from_millis(250));
    assert_eq!(settings.max_concurrent_collectors, 4);
    assert!((settings.acceptance_threshold - 0.7).abs() < 1e-9);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.logging.level, "info");

    assert_eq!(config.collectors.len(), 2);
    assert_eq!(config.collectors[0].request_delay(), Duration::ZERO);
    assert_eq!(config.enabled_collectors().count(), 1);
    assert_eq!(build_collectors(&config).unwrap().len(), 1);
}

#[test]
fn test_html_collector_section() {
    let file = toml_file(
        r#"
        [[collectors]]
        source_id = "corner-butcher"
        kind = "html"
        base_url = "https://butcher.example.co.il"
        categories = ["/meat", "/poultry"]

        [collectors.selectors]
        product_container = [".tile"]
        name = [".title"]
        price = [".price"]
        "#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    let butcher = &config.collectors[0];
    assert_eq!(butcher.kind, CollectorKind::Html);
    assert_eq!(butcher.categories, vec!["/meat", "/poultry"]);
    assert_eq!(butcher.request_delay(), Duration::from_millis(1000));
    assert!(butcher.selectors.as_ref().unwrap().weight.is_empty());
}

#[test]
fn test_environment_overrides_file() {
    let file = toml_file(
        r#"
        [coordinator]
        stagger_offset_ms = 250
        "#,
    );
    let environment = HashMap::from([
        ("BASAROMETER_COORDINATOR__STAGGER_OFFSET_MS".to_string(), "900".to_string()),
        ("BASAROMETER_LOGGING__LEVEL".to_string(), "debug".to_string()),
    ]);

    let config = AppConfig::from_sources(Some(file.path()), Some(environment)).unwrap();
    assert_eq!(config.coordinator.stagger_offset_ms, 900);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = toml_file(
        r#"
        [validation]
        acceptance_threshold = 1.4
        "#,
    );
    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("acceptance_threshold"));

    let file = toml_file(
        r#"
        [ingestion]
        base_url = "not a url"
        "#,
    );
    assert!(AppConfig::from_file(file.path()).is_err());
}

#[test]
fn test_ingestion_section_defaults() {
    let file = toml_file(
        r#"
        [ingestion]
        base_url = "https://catalog.example.org"
        "#,
    );
    let config = AppConfig::from_file(file.path()).unwrap();
    let ingestion = config.ingestion.unwrap();
    assert_eq!(ingestion.batch_size, 20);
    assert_eq!(ingestion.batch_delay_ms, 1000);
    assert_eq!(ingestion.api_key, None);
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(AppConfig::from_file("/nonexistent/basarometer.toml").is_err());
}
