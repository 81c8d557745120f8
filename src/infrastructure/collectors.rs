//! Source collector implementations and the configuration-driven factory

pub mod fixture;
pub mod html_listing;
pub mod mega;
pub mod victory;

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tracing::info;

use crate::domain::records::SourceId;
use crate::domain::services::collector::SourceCollector;
use crate::infrastructure::config::{AppConfig, CollectorConfig, CollectorKind};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};

pub use html_listing::{HtmlListingCollector, ListingSelectors, parse_listing_page};
pub use mega::MegaCollector;
pub use victory::VictoryCollector;

/// Builds one collector per enabled entry, in configuration order
pub fn build_collectors(config: &AppConfig) -> Result<Vec<Arc<dyn SourceCollector>>> {
    let collectors = config
        .enabled_collectors()
        .map(|entry| build_collector(entry, config))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "🏭 Built {} collectors: {}",
        collectors.len(),
        collectors
            .iter()
            .map(|c| c.source_id().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(collectors)
}

fn build_collector(entry: &CollectorConfig, config: &AppConfig) -> Result<Arc<dyn SourceCollector>> {
    let source_id = SourceId::new(entry.source_id.clone());
    let collector: Arc<dyn SourceCollector> = match entry.kind {
        CollectorKind::Victory => Arc::new(VictoryCollector::new(
            source_id,
            entry.categories.clone(),
            entry.fixture_path.clone(),
            entry.request_delay(),
            entry.timeout(),
        )),
        CollectorKind::Mega => Arc::new(MegaCollector::new(
            source_id,
            entry.categories.clone(),
            entry.fixture_path.clone(),
            entry.request_delay(),
            entry.timeout(),
        )),
        CollectorKind::Html => {
            let base_url = entry
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow!("{}: html collectors need a base_url", entry.source_id))?;
            let base_url = url::Url::parse(base_url)
                .with_context(|| format!("{}: invalid base_url", entry.source_id))?;
            let selectors = entry
                .selectors
                .as_ref()
                .ok_or_else(|| anyhow!("{}: html collectors need selectors", entry.source_id))?;
            let selectors = ListingSelectors::compile(selectors)
                .map_err(|e| anyhow!("{}: {}", entry.source_id, e))?;

            let http_config = HttpClientConfig {
                request_delay: entry.request_delay(),
                ..HttpClientConfig::default()
            };
            let http = HttpClient::new(&http_config, config.retry.clone())
                .with_context(|| format!("{}: cannot build HTTP client", entry.source_id))?;

            Arc::new(HtmlListingCollector::new(
                source_id,
                base_url,
                entry.categories.clone(),
                selectors,
                http,
                entry.timeout(),
            ))
        }
    };
    Ok(collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::HtmlSelectorConfig;
    use std::time::Duration;

    #[test]
    fn test_default_config_builds_reference_adapters() {
        let collectors = build_collectors(&AppConfig::default()).unwrap();
        let ids: Vec<_> = collectors.iter().map(|c| c.source_id().to_string()).collect();
        assert_eq!(ids, vec!["victory", "mega"]);
        assert_eq!(collectors[0].timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_disabled_collectors_are_skipped() {
        let mut config = AppConfig::default();
        config.collectors[1].enabled = false;
        let collectors = build_collectors(&config).unwrap();
        assert_eq!(collectors.len(), 1);
    }

    #[test]
    fn test_html_collector_from_config() {
        let mut config = AppConfig::default();
        config.collectors.push(CollectorConfig {
            source_id: "corner-butcher".to_string(),
            kind: CollectorKind::Html,
            enabled: true,
            request_delay_ms: Some(0),
            timeout_secs: Some(10),
            fixture_path: None,
            base_url: Some("https://butcher.example.co.il".to_string()),
            categories: vec!["/meat".to_string()],
            selectors: Some(HtmlSelectorConfig {
                product_container: vec![".tile".to_string()],
                name: vec![".title".to_string()],
                price: vec![".price".to_string()],
                weight: Vec::new(),
                original_price: Vec::new(),
                brand: Vec::new(),
                kosher: Vec::new(),
            }),
        });

        let collectors = build_collectors(&config).unwrap();
        assert_eq!(collectors.len(), 3);
        assert_eq!(collectors[2].timeout(), Duration::from_secs(10));
    }
}
